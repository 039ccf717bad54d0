//! Opaque blob references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key into the blob store.
///
/// The core never assumes a particular storage medium; a ref is just a
/// string key the store can resolve back to bytes or a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub String);

impl BlobRef {
    /// Create from an existing key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the inner key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlobRef {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
