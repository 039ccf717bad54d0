//! Per-job render executor.
//!
//! One tokio task per submitted job, spawned fire-and-forget at submission
//! time. The task drives probe, filter graph compilation, and the external
//! render, and communicates completion purely by mutating the job store
//! entry; the submitter observes progress only by polling.

pub mod config;
pub mod error;
pub mod runner;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use runner::JobRunner;
