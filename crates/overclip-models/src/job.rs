//! Job record and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::blob::BlobRef;
use crate::overlay::OverlayDescriptor;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
///
/// Transitions are one-directional and fire exactly once per job:
/// `Pending -> Processing -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job created, executor not yet started
    #[default]
    Pending,
    /// Job picked up by its executor
    Processing,
    /// Rendering finished, result available
    Completed,
    /// A processing step failed; `error` carries the reason
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end-to-end request to render a source video with an overlay set.
///
/// Created in `Pending` by the job store; mutated exclusively by the
/// executor running the job; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Uploaded source video
    pub source: BlobRef,

    /// Overlays in submission order (back-to-front paint order)
    pub overlays: Vec<OverlayDescriptor>,

    /// Rendered output (set iff `Completed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BlobRef>,

    /// Failure reason (set iff `Failed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Terminal timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(source: BlobRef, overlays: Vec<OverlayDescriptor>) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            source,
            overlays,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
