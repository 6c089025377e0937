use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::WaitPolicy;
use crate::error::TrackError;
use crate::provider::{JobClient, JobScope};
use crate::tracker::{
    EntityTreeResolver, JobStatusPoller, STATUS_SUCCESS, WaitReport, WaitSpec,
};

/// Caller-facing entry points: wait for a job to succeed, then read the ids it produced.
///
/// Holds no per-job state, so one tracker can serve any number of concurrent
/// waits on independent job ids.
pub struct TaskTracker<C> {
    client: C,
    scope: JobScope,
    policy: WaitPolicy,
    cancel: CancellationToken,
}

impl<C: JobClient> TaskTracker<C> {
    /// Create a tracker with the default 10s / 600s wait policy.
    pub fn new(client: C, scope: JobScope) -> Self {
        Self {
            client,
            scope,
            policy: WaitPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use `token` to abort in-flight waits. Each wait listens on a child token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels every wait running on this tracker.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scope(&self) -> &JobScope {
        &self.scope
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Current status of a job, from a single fetch.
    pub async fn job_status(&self, job_id: &str) -> Result<String, TrackError> {
        let doc = self.client.fetch_job(&self.scope, job_id).await?;
        Ok(doc.status().to_string())
    }

    /// Wait for `target_status` under the tracker's policy.
    pub async fn wait_for(
        &self,
        job_id: &str,
        target_status: &str,
    ) -> Result<WaitReport, TrackError> {
        let spec = self.policy.spec_for(target_status);
        self.wait_with(job_id, &spec).await
    }

    /// Like [`wait_for`](Self::wait_for) but never past `deadline`, so several
    /// waits can share one overall budget.
    pub async fn wait_for_until(
        &self,
        job_id: &str,
        target_status: &str,
        deadline: Instant,
    ) -> Result<WaitReport, TrackError> {
        let spec = self.policy.spec_for(target_status).with_deadline(deadline);
        self.wait_with(job_id, &spec).await
    }

    async fn wait_with(&self, job_id: &str, spec: &WaitSpec) -> Result<WaitReport, TrackError> {
        let cancel = self.cancel.child_token();
        JobStatusPoller::new(&self.client, &self.scope)
            .wait_for_status(job_id, spec, &cancel)
            .await
    }

    /// Wait for the job to succeed, then read `entities.<field>`.
    #[instrument(skip(self), fields(service = %self.scope.service, region = %self.scope.region), err)]
    pub async fn get_single_entity_id(
        &self,
        job_id: &str,
        field: &str,
    ) -> Result<String, TrackError> {
        self.wait_for(job_id, STATUS_SUCCESS).await?;
        EntityTreeResolver::new(&self.client, &self.scope)
            .resolve_leaf_field_value(job_id, field)
            .await
    }

    /// Wait for the job to succeed, then read `entities.<field>` of every sub-job, in order.
    #[instrument(skip(self), fields(service = %self.scope.service, region = %self.scope.region), err)]
    pub async fn get_all_sub_entity_ids(
        &self,
        job_id: &str,
        field: &str,
    ) -> Result<Vec<String>, TrackError> {
        self.wait_for(job_id, STATUS_SUCCESS).await?;
        EntityTreeResolver::new(&self.client, &self.scope)
            .resolve_all_sub_job_field_values(job_id, field)
            .await
    }
}
