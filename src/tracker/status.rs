/// Reserved status the provider reports once a job has finished successfully.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Reserved status the provider reports once a job has failed.
pub const STATUS_FAIL: &str = "FAIL";

/// How a waiter interprets an observed status.
///
/// Only the two reserved sentinels are recognised; every other string is an
/// opaque provider-specific in-progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Failed,
    InProgress,
}

impl StatusClass {
    pub fn of(status: &str) -> Self {
        match status {
            STATUS_SUCCESS => StatusClass::Success,
            STATUS_FAIL => StatusClass::Failed,
            _ => StatusClass::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, StatusClass::InProgress)
    }
}
