//! Shared data models for the Overclip backend.
//!
//! This crate provides Serde-serializable types for:
//! - Overlay descriptors and their validation
//! - Jobs and job status
//! - Blob references into the upload/result store

pub mod blob;
pub mod job;
pub mod overlay;
pub mod validate;

// Re-export common types
pub use blob::BlobRef;
pub use job::{Job, JobId, JobStatus};
pub use overlay::{OverlayDescriptor, OverlayKind};
pub use validate::{validate_overlays, ValidationError, ValidationResult};
