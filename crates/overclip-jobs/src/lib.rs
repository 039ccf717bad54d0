//! In-memory job store and lifecycle state machine.
//!
//! The store owns the only shared mutable state in the system: the map of
//! job id to job record. Status polling reads concurrently; each job's own
//! executor is the single writer for that job's mutable fields. Records
//! live for the process lifetime; eviction is a known extension point.

pub mod error;
pub mod store;

pub use error::{JobError, JobResult};
pub use store::JobStore;
