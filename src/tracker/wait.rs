use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::status::STATUS_SUCCESS;

/// Shortest pause between two polls, whatever `poll_interval` says.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Parameters for a single wait call. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// Status the waiter is polling to observe.
    pub target_status: String,
    /// Pause between two polls.
    pub poll_interval: Duration,
    /// Budget for this wait, measured from its first poll.
    pub timeout: Duration,
    /// Absolute deadline shared with other waits; the earlier of this and
    /// `start + timeout` wins.
    pub deadline: Option<Instant>,
    /// Consecutive transient fetch failures tolerated before giving up.
    pub transport_retries: u32,
}

impl WaitSpec {
    pub fn new(target_status: impl Into<String>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            target_status: target_status.into(),
            poll_interval,
            timeout,
            deadline: None,
            transport_retries: 0,
        }
    }

    pub fn until_success(poll_interval: Duration, timeout: Duration) -> Self {
        Self::new(STATUS_SUCCESS, poll_interval, timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    /// Effective deadline for a wait that started at `start`.
    pub fn deadline_from(&self, start: Instant) -> Instant {
        let own = start + self.timeout;
        match self.deadline {
            Some(shared) => own.min(shared),
            None => own,
        }
    }
}

/// Outcome of a wait that observed its target status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitReport {
    pub job_id: String,
    pub target_status: String,
    pub final_status: String,
    /// Number of fetches issued, failed ones included.
    pub polls: u32,
    /// Transient fetch failures absorbed along the way.
    pub transport_errors: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Budget left on the effective deadline when the wait finished.
    pub remaining_ms: u64,
}
