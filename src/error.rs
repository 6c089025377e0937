use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum TrackError {
    /// Fetching the job document failed. The provider error is kept as-is.
    #[error("transport error: {0}")]
    Transport(#[from] ProviderError),

    #[error("job {job_id} failed{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    JobFailed {
        job_id: String,
        reason: Option<String>,
    },

    #[error("job {job_id}: field not found at `{path}`")]
    FieldNotFound { job_id: String, path: String },

    #[error("job {job_id}: expected {expected} at `{path}`")]
    UnexpectedType {
        job_id: String,
        path: String,
        expected: &'static str,
    },

    #[error(
        "job {job_id} did not reach {target_status} within {elapsed_ms}ms (last status: {})",
        .last_status.as_deref().unwrap_or("none")
    )]
    Timeout {
        job_id: String,
        target_status: String,
        last_status: Option<String>,
        elapsed_ms: u64,
    },

    #[error("wait for job {job_id} was cancelled")]
    Cancelled { job_id: String },
}

impl TrackError {
    /// The job id this error refers to, if it is not a bare transport error.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            TrackError::Transport(_) => None,
            TrackError::JobFailed { job_id, .. }
            | TrackError::FieldNotFound { job_id, .. }
            | TrackError::UnexpectedType { job_id, .. }
            | TrackError::Timeout { job_id, .. }
            | TrackError::Cancelled { job_id } => Some(job_id),
        }
    }
}
