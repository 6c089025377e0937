mod payload;
mod poller;
mod resolver;
mod status;
mod wait;

pub use payload::{LeafFields, PayloadError, PayloadShape, ResultPayload};
pub use poller::JobStatusPoller;
pub use resolver::EntityTreeResolver;
pub use status::{STATUS_FAIL, STATUS_SUCCESS, StatusClass};
pub use wait::{MIN_POLL_INTERVAL, WaitReport, WaitSpec};

#[cfg(test)]
pub(crate) use poller::tests::ScriptedClient;
