//! Worker configuration.

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum jobs rendering at once (admission control)
    pub max_concurrent_jobs: usize,
    /// Blob store data root
    pub data_dir: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            data_dir: "./data".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        }
    }
}
