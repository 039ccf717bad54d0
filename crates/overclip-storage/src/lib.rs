//! Local filesystem blob store.
//!
//! This crate provides:
//! - Keyed byte storage for uploads, overlay media, and render results
//! - Resolution of opaque [`BlobRef`]s back to paths and readable files
//! - Byte-for-byte copies between refs (pass-through jobs)
//!
//! Keys are relative paths under a single data root; nothing above the
//! root is ever addressable.

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::LocalBlobStore;

pub use overclip_models::BlobRef;
