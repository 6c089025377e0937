//! Tracks asynchronous provider jobs to completion and resolves the ids of the
//! resources they produced.
//!
//! [`TaskTracker`] is the entry point: it polls a job until it reports
//! `SUCCESS` (or fails, times out, or is cancelled) and then reads the
//! requested field from the job's result payload, either from a single result
//! or from every sub-job of a batch.

pub mod config;
pub mod error;
pub mod facade;
pub mod provider;
pub mod tracker;

pub use config::{TrackerConfig, WaitPolicy};
pub use error::TrackError;
pub use facade::TaskTracker;
pub use provider::{HttpJobClient, JobClient, JobDocument, JobScope, ProviderError};
pub use tracker::{WaitReport, WaitSpec};
