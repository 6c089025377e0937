pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpJobClient, JobClient};
pub use error::ProviderError;
pub use types::{JobDocument, JobScope};
