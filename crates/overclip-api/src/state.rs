//! Application state.

use std::sync::Arc;

use overclip_jobs::JobStore;
use overclip_media::FfmpegEngine;
use overclip_storage::LocalBlobStore;
use overclip_worker::{JobRunner, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: JobStore,
    pub blobs: Arc<LocalBlobStore>,
    pub runner: JobRunner,
}

impl AppState {
    /// Create application state with the ffmpeg-backed engine.
    pub async fn new(
        config: ApiConfig,
        worker_config: WorkerConfig,
    ) -> Result<Self, overclip_storage::StorageError> {
        let blobs = Arc::new(LocalBlobStore::new(&worker_config.data_dir).await?);
        let store = JobStore::new();
        let runner = JobRunner::new(
            store.clone(),
            Arc::clone(&blobs),
            Arc::new(FfmpegEngine::new()),
            &worker_config,
        );

        Ok(Self {
            config,
            store,
            blobs,
            runner,
        })
    }
}
