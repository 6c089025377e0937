use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::status::StatusClass;
use super::wait::{MIN_POLL_INTERVAL, WaitReport, WaitSpec};
use crate::error::TrackError;
use crate::provider::{JobClient, JobScope, ProviderError};

/// Polls a job at a fixed cadence until it reaches a target status.
pub struct JobStatusPoller<'a, C> {
    client: &'a C,
    scope: &'a JobScope,
}

impl<'a, C: JobClient> JobStatusPoller<'a, C> {
    pub fn new(client: &'a C, scope: &'a JobScope) -> Self {
        Self { client, scope }
    }

    /// Wait until the job reports `spec.target_status`.
    ///
    /// - The target status is checked before `FAIL`, so waiting for `FAIL` itself works.
    /// - `FAIL` ends the wait with [`TrackError::JobFailed`].
    /// - Any other status sleeps for the poll interval (at least [`MIN_POLL_INTERVAL`])
    ///   and polls again.
    /// - Fetch errors end the wait unchanged, unless they are transient and the
    ///   `spec` still has consecutive retries left.
    /// - Running past the effective deadline yields [`TrackError::Timeout`].
    /// - Cancelling `cancel` interrupts the sleep and yields [`TrackError::Cancelled`].
    pub async fn wait_for_status(
        &self,
        job_id: &str,
        spec: &WaitSpec,
        cancel: &CancellationToken,
    ) -> Result<WaitReport, TrackError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let deadline = spec.deadline_from(start);

        let mut polls: u32 = 0;
        let mut transport_errors: u32 = 0;
        let mut consecutive_errors: u32 = 0;
        let mut last_status: Option<String> = None;

        while Instant::now() < deadline {
            if cancel.is_cancelled() {
                return Err(TrackError::Cancelled {
                    job_id: job_id.to_string(),
                });
            }

            polls += 1;
            let mut pause = spec.poll_interval.max(MIN_POLL_INTERVAL);

            match self.client.fetch_job(self.scope, job_id).await {
                Ok(doc) => {
                    consecutive_errors = 0;
                    let status = doc.status();
                    debug!(job_id, status, poll = polls, "polled job status");

                    if status == spec.target_status {
                        let now = Instant::now();
                        info!(
                            job_id,
                            status,
                            polls,
                            elapsed_ms = millis(now - start),
                            "job reached target status"
                        );
                        return Ok(WaitReport {
                            job_id: job_id.to_string(),
                            target_status: spec.target_status.clone(),
                            final_status: status.to_string(),
                            polls,
                            transport_errors,
                            started_at,
                            finished_at: Utc::now(),
                            elapsed_ms: millis(now - start),
                            remaining_ms: millis(deadline.saturating_duration_since(now)),
                        });
                    }

                    if StatusClass::of(status) == StatusClass::Failed {
                        debug!(job_id, document = %doc.raw(), "job failed");
                        return Err(TrackError::JobFailed {
                            job_id: job_id.to_string(),
                            reason: doc.fail_reason().map(str::to_string),
                        });
                    }

                    last_status = Some(status.to_string());
                }
                Err(err) if err.is_transient() && consecutive_errors < spec.transport_retries => {
                    consecutive_errors += 1;
                    transport_errors += 1;
                    warn!(
                        job_id,
                        error = %err,
                        attempt = consecutive_errors,
                        max = spec.transport_retries,
                        "transient error fetching job, retrying"
                    );
                    if let ProviderError::RateLimited { retry_after_ms } = err {
                        pause = pause.max(Duration::from_millis(retry_after_ms));
                    }
                }
                Err(err) => return Err(err.into()),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(TrackError::Cancelled { job_id: job_id.to_string() });
                }
                _ = sleep(pause.min(remaining)) => {}
            }
        }

        let elapsed_ms = millis(start.elapsed());
        warn!(job_id, target = %spec.target_status, polls, elapsed_ms, "timed out waiting for job");
        Err(TrackError::Timeout {
            job_id: job_id.to_string(),
            target_status: spec.target_status.clone(),
            last_status,
            elapsed_ms,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::JobDocument;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted in-memory client. Replays responses in order and repeats the
    /// last one once the script runs out.
    pub(crate) struct ScriptedClient {
        script: Mutex<VecDeque<Result<Value, (u16, &'static str)>>>,
        last: Mutex<Option<Result<Value, (u16, &'static str)>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedClient {
        pub(crate) fn new(script: Vec<Result<Value, (u16, &'static str)>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn statuses(statuses: &[&str]) -> Self {
            Self::new(
                statuses
                    .iter()
                    .map(|s| Ok(json!({"status": s})))
                    .collect(),
            )
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JobClient for ScriptedClient {
        async fn fetch_job(
            &self,
            _scope: &JobScope,
            _job_id: &str,
        ) -> Result<JobDocument, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                match script.pop_front() {
                    Some(step) => {
                        *last = Some(step.clone());
                        step
                    }
                    None => last.clone().expect("empty script"),
                }
            };
            match next {
                Ok(value) => JobDocument::from_value(value),
                Err((status, message)) => Err(ProviderError::Api {
                    status,
                    message: message.to_string(),
                }),
            }
        }
    }

    fn scope() -> JobScope {
        JobScope::new("ecs", "region-1")
    }

    fn spec(interval_secs: u64, timeout_secs: u64) -> WaitSpec {
        WaitSpec::until_success(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_does_not_sleep() {
        let client = ScriptedClient::statuses(&["SUCCESS"]);
        let scope = scope();
        let start = Instant::now();

        let report = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-1", &spec(10, 600), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(Instant::now(), start);
        assert_eq!(client.calls(), 1);
        assert_eq!(report.polls, 1);
        assert_eq!(report.final_status, "SUCCESS");
        assert_eq!(report.elapsed_ms, 0);
        assert_eq!(report.remaining_ms, 600_000);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_on_first_poll_fetches_once() {
        let client = ScriptedClient::new(vec![Ok(json!({
            "status": "FAIL",
            "fail_reason": "insufficient quota"
        }))]);
        let scope = scope();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-2", &spec(10, 600), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 1);
        match err {
            TrackError::JobFailed { job_id, reason } => {
                assert_eq!(job_id, "j-2");
                assert_eq!(reason.as_deref(), Some("insufficient quota"));
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn running_twice_then_success_polls_three_times() {
        let client = ScriptedClient::statuses(&["RUNNING", "RUNNING", "SUCCESS"]);
        let scope = scope();
        let start = Instant::now();

        let report = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-3", &spec(1, 10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.calls(), 3);
        assert_eq!(report.polls, 3);
        assert_eq!(Instant::now() - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_statuses_are_treated_as_in_progress() {
        let client = ScriptedClient::statuses(&["INIT", "PENDING_PAYMENT", "success", "SUCCESS"]);
        let scope = scope();

        let report = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-4", &spec(1, 10), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.polls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out_with_explicit_error() {
        let client = ScriptedClient::statuses(&["RUNNING"]);
        let scope = scope();
        let start = Instant::now();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-5", &spec(1, 10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(Instant::now() - start, Duration::from_secs(10));
        assert_eq!(client.calls(), 10);
        match err {
            TrackError::Timeout {
                job_id,
                target_status,
                last_status,
                elapsed_ms,
            } => {
                assert_eq!(job_id, "j-5");
                assert_eq!(target_status, "SUCCESS");
                assert_eq!(last_status.as_deref(), Some("RUNNING"));
                assert_eq!(elapsed_ms, 10_000);
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_still_sleeps_between_polls() {
        let client = ScriptedClient::statuses(&["RUNNING"]);
        let scope = scope();
        let spec = WaitSpec::until_success(Duration::ZERO, Duration::from_secs(1));

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-15", &spec, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::Timeout { .. }));
        assert_eq!(client.calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_fetches() {
        let client = ScriptedClient::statuses(&["SUCCESS"]);
        let scope = scope();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-6", &spec(1, 0), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 0);
        assert!(matches!(err, TrackError::Timeout { last_status: None, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_propagates_without_retry() {
        let client = ScriptedClient::new(vec![
            Ok(json!({"status": "RUNNING"})),
            Err((503, "service unavailable")),
            Ok(json!({"status": "SUCCESS"})),
        ]);
        let scope = scope();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-7", &spec(1, 10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 2);
        match err {
            TrackError::Transport(ProviderError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "service unavailable");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_absorbed_within_retry_budget() {
        let client = ScriptedClient::new(vec![
            Err((502, "bad gateway")),
            Err((503, "unavailable")),
            Ok(json!({"status": "RUNNING"})),
            Err((500, "oops")),
            Ok(json!({"status": "SUCCESS"})),
        ]);
        let scope = scope();

        let report = JobStatusPoller::new(&client, &scope)
            .wait_for_status(
                "j-8",
                &spec(1, 60).with_transport_retries(2),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(client.calls(), 5);
        assert_eq!(report.transport_errors, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_counts_consecutive_failures() {
        let client = ScriptedClient::new(vec![
            Err((502, "bad gateway")),
            Err((503, "unavailable")),
            Err((504, "timeout")),
        ]);
        let scope = scope();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status(
                "j-9",
                &spec(1, 60).with_transport_retries(2),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 3);
        assert!(matches!(
            err,
            TrackError::Transport(ProviderError::Api { status: 504, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_never_retried() {
        let client = ScriptedClient::new(vec![Err((401, "token expired"))]);
        let scope = scope();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status(
                "j-10",
                &spec(1, 60).with_transport_retries(5),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 1);
        assert!(matches!(
            err,
            TrackError::Transport(ProviderError::Api { status: 401, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_for_fail_as_target_succeeds() {
        let client = ScriptedClient::statuses(&["RUNNING", "FAIL"]);
        let scope = scope();

        let report = JobStatusPoller::new(&client, &scope)
            .wait_for_status(
                "j-11",
                &WaitSpec::new("FAIL", Duration::from_secs(1), Duration::from_secs(10)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.final_status, "FAIL");
    }

    #[tokio::test(start_paused = true)]
    async fn shared_deadline_shortens_wait() {
        let client = ScriptedClient::statuses(&["RUNNING"]);
        let scope = scope();
        let deadline = Instant::now() + Duration::from_secs(3);

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status(
                "j-12",
                &spec(1, 600).with_deadline(deadline),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(Instant::now(), deadline);
        assert_eq!(client.calls(), 3);
        assert!(matches!(err, TrackError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let client = ScriptedClient::statuses(&["RUNNING"]);
        let scope = scope();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(25)).await;
            trigger.cancel();
        });

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-13", &spec(10, 600), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::Cancelled { ref job_id } if job_id == "j-13"));
        assert_eq!(Instant::now() - start, Duration::from_secs(25));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_skips_fetch() {
        let client = ScriptedClient::statuses(&["SUCCESS"]);
        let scope = scope();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = JobStatusPoller::new(&client, &scope)
            .wait_for_status("j-14", &spec(10, 600), &cancel)
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 0);
        assert!(matches!(err, TrackError::Cancelled { .. }));
    }
}
