//! Blob store rooted at a data directory.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;

use overclip_models::BlobRef;

use crate::error::{StorageError, StorageResult};

/// Subdirectories created under the data root.
const SUBDIRS: &[&str] = &["uploads", "overlays", "results"];

/// Filesystem-backed blob store keyed by relative paths.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open (and lay out) a store at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        for subdir in SUBDIRS {
            fs::create_dir_all(root.join(subdir)).await.map_err(|e| {
                StorageError::config_error(format!("cannot create {}: {}", subdir, e))
            })?;
        }
        Ok(Self { root })
    }

    /// Store bytes under `key`, returning the ref.
    pub async fn store(&self, key: &str, bytes: &[u8]) -> StorageResult<BlobRef> {
        let path = self.checked_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::write_failed(format!("{}: {}", key, e)))?;
        debug!(key, size = bytes.len(), "Stored blob");
        Ok(BlobRef::new(key))
    }

    /// Copy an existing blob to a new key, byte for byte.
    pub async fn copy(&self, src: &BlobRef, dest_key: &str) -> StorageResult<BlobRef> {
        let src_path = self.resolve(src)?;
        let dest_path = self.checked_path(dest_key)?;
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&src_path, &dest_path)
            .await
            .map_err(|e| StorageError::write_failed(format!("{}: {}", dest_key, e)))?;
        Ok(BlobRef::new(dest_key))
    }

    /// Resolve a ref to the backing path, failing if the blob is absent.
    pub fn resolve(&self, blob: &BlobRef) -> StorageResult<PathBuf> {
        let path = self.checked_path(blob.as_str())?;
        if !path.exists() {
            return Err(StorageError::not_found(blob.as_str()));
        }
        Ok(path)
    }

    /// Path a ref will occupy, whether or not the blob exists yet.
    ///
    /// The renderer writes its output here before the blob is visible.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        self.checked_path(key)
    }

    /// Open a blob for reading.
    pub async fn open(&self, blob: &BlobRef) -> StorageResult<fs::File> {
        let path = self.resolve(blob)?;
        Ok(fs::File::open(path).await?)
    }

    /// Read a whole blob into memory.
    pub async fn read(&self, blob: &BlobRef) -> StorageResult<Vec<u8>> {
        let path = self.resolve(blob)?;
        Ok(fs::read(path).await?)
    }

    /// Whether a ref currently resolves to bytes.
    pub fn exists(&self, blob: &BlobRef) -> bool {
        self.checked_path(blob.as_str())
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Join a key under the root, rejecting empty, absolute, and escaping
    /// keys so callers cannot address files outside the store.
    fn checked_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("empty key"));
        }
        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::invalid_key(key)),
            }
        }
        Ok(self.root.join(relative))
    }
}
