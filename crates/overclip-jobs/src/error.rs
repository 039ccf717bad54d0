//! Job store error types.

use overclip_models::{JobId, JobStatus};
use thiserror::Error;

/// Result type for job store operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors from job lookup and state transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}
