//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors occurring while executing a job.
///
/// None of these propagate to the submitter; every one ends up as the
/// failed job's reason string, observable through a status query.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Overlay media not found: {0}")]
    AuxMissing(String),

    #[error("Result file absent after render: {0}")]
    ResultMissing(String),

    #[error("Media error: {0}")]
    Media(#[from] overclip_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] overclip_storage::StorageError),

    #[error("Job store error: {0}")]
    Job(#[from] overclip_jobs::JobError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Human-readable failure reason, including any diagnostic output the
    /// external renderer produced.
    pub fn reason(&self) -> String {
        match self {
            WorkerError::Media(e) => match e.diagnostic() {
                Some(stderr) if !stderr.trim().is_empty() => {
                    format!("{}: {}", e, stderr.trim())
                }
                _ => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}
