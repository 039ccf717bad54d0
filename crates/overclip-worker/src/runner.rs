//! The job runner: drives one job from PENDING to a terminal state.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use overclip_jobs::JobStore;
use overclip_media::{compile_overlays, RenderEngine, RenderRequest};
use overclip_models::{BlobRef, Job, JobId};
use overclip_storage::LocalBlobStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Spawns and drives one executor task per submitted job.
///
/// Cloning shares the underlying store, blob store, engine, and the
/// admission semaphore. A job's task is the only writer of that job's
/// record; the semaphore bounds how many render at once without blocking
/// submission.
#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    blobs: Arc<LocalBlobStore>,
    engine: Arc<dyn RenderEngine>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    /// Create a new runner.
    pub fn new(
        store: JobStore,
        blobs: Arc<LocalBlobStore>,
        engine: Arc<dyn RenderEngine>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            engine,
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
        }
    }

    /// Fire-and-forget execution of a submitted job.
    ///
    /// The handle is returned for tests; the transport layer drops it.
    pub fn spawn(&self, id: JobId) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(id).await })
    }

    /// Run a job to its terminal state. Never returns an error: every
    /// failure lands in the job record as a FAILED reason.
    pub async fn run(&self, id: JobId) {
        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!(job_id = %id, "Admission semaphore closed");
                return;
            }
        };

        if let Err(e) = self.store.mark_processing(&id).await {
            error!(job_id = %id, error = %e, "Cannot start job");
            return;
        }
        info!(job_id = %id, "Processing job");

        match self.execute(&id).await {
            Ok(result) => {
                info!(job_id = %id, result = %result, "Job completed");
                if let Err(e) = self.store.mark_completed(&id, result).await {
                    error!(job_id = %id, error = %e, "Cannot record completion");
                }
            }
            Err(e) => {
                let reason = e.reason();
                warn!(job_id = %id, reason = %reason, "Job failed");
                if let Err(e) = self.store.mark_failed(&id, reason).await {
                    error!(job_id = %id, error = %e, "Cannot record failure");
                }
            }
        }
    }

    /// Probe, compile, render; returns the result ref.
    async fn execute(&self, id: &JobId) -> WorkerResult<BlobRef> {
        let job = self.store.get(id).await?;
        let result_key = format!("results/{}_result.mp4", id);

        // No overlays: the result is the source, byte for byte.
        if job.overlays.is_empty() {
            return Ok(self.blobs.copy(&job.source, &result_key).await?);
        }

        let source_path = self.blobs.resolve(&job.source)?;
        let info = self.engine.probe(&source_path).await?;

        let graph = compile_overlays(info.width, info.height, &job.overlays);

        // Auxiliary refs must resolve to bytes before compilation output
        // reaches the renderer.
        let mut aux_paths = Vec::with_capacity(graph.aux_inputs.len());
        for key in &graph.aux_inputs {
            let path = self
                .blobs
                .resolve(&BlobRef::new(key.clone()))
                .map_err(|_| WorkerError::AuxMissing(key.clone()))?;
            aux_paths.push(path);
        }

        let request = RenderRequest {
            source: source_path,
            aux_inputs: aux_paths,
            filter_complex: graph.to_filter_complex(),
            output: self.blobs.path_for(&result_key)?,
        };
        self.engine.render(&request).await?;

        let result = BlobRef::new(result_key);
        if !self.blobs.exists(&result) {
            // Renderer reported success but wrote nothing.
            return Err(WorkerError::ResultMissing(result.to_string()));
        }
        Ok(result)
    }

    /// Snapshot accessor used by tests.
    pub async fn job(&self, id: &JobId) -> overclip_jobs::JobResult<Job> {
        self.store.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use overclip_media::{MediaError, MediaResult, VideoInfo};
    use overclip_models::{JobStatus, OverlayDescriptor, OverlayKind};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fake engine with scriptable probe/render behavior.
    struct FakeEngine {
        probe_fails: bool,
        render_fails: bool,
        write_output: bool,
        renders: AtomicUsize,
    }

    impl FakeEngine {
        fn ok() -> Self {
            Self {
                probe_fails: false,
                render_fails: false,
                write_output: true,
                renders: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RenderEngine for FakeEngine {
        async fn probe(&self, _input: &Path) -> MediaResult<VideoInfo> {
            if self.probe_fails {
                return Err(MediaError::ffprobe_failed(
                    "FFprobe exited with non-zero status",
                    Some("moov atom not found".to_string()),
                ));
            }
            Ok(VideoInfo {
                width: 1920,
                height: 1080,
                duration: 10.0,
            })
        }

        async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if self.render_fails {
                return Err(MediaError::ffmpeg_failed(
                    "FFmpeg exited with non-zero status",
                    Some("Error initializing filter 'drawtext'".to_string()),
                    Some(1),
                ));
            }
            if self.write_output {
                tokio::fs::write(&request.output, b"rendered").await?;
            }
            Ok(())
        }
    }

    fn text_overlay(id: &str) -> OverlayDescriptor {
        OverlayDescriptor {
            id: id.to_string(),
            kind: OverlayKind::Text,
            content: "Hello".to_string(),
            position_x: 0.5,
            position_y: 0.5,
            start_time: 0.0,
            end_time: 3.0,
            width: None,
            height: None,
            font_size: None,
            font_color: None,
        }
    }

    fn image_overlay(id: &str, content: &str) -> OverlayDescriptor {
        OverlayDescriptor {
            kind: OverlayKind::Image,
            content: content.to_string(),
            ..text_overlay(id)
        }
    }

    async fn setup(engine: FakeEngine) -> (TempDir, JobRunner, Arc<LocalBlobStore>) {
        let dir = TempDir::new().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(dir.path()).await.unwrap());
        let runner = JobRunner::new(
            JobStore::new(),
            Arc::clone(&blobs),
            Arc::new(engine),
            &WorkerConfig::default(),
        );
        (dir, runner, blobs)
    }

    #[tokio::test]
    async fn test_no_overlays_copies_source_verbatim() {
        let (_dir, runner, blobs) = setup(FakeEngine::ok()).await;
        let source = blobs.store("uploads/a.mp4", b"original bytes").await.unwrap();

        let id = runner.store.create(source, Vec::new()).await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let result = job.result.unwrap();
        assert_eq!(blobs.read(&result).await.unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_text_overlay_renders_and_completes() {
        let (_dir, runner, blobs) = setup(FakeEngine::ok()).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();

        let id = runner
            .store
            .create(source, vec![text_overlay("t1")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(blobs.exists(&job.result.unwrap()));
    }

    #[tokio::test]
    async fn test_render_failure_records_diagnostics() {
        let engine = FakeEngine {
            render_fails: true,
            ..FakeEngine::ok()
        };
        let (_dir, runner, blobs) = setup(engine).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();

        let id = runner
            .store
            .create(source, vec![text_overlay("t1")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        let reason = job.error.unwrap();
        assert!(!reason.is_empty());
        assert!(reason.contains("drawtext"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn test_probe_failure_fails_job() {
        let engine = FakeEngine {
            probe_fails: true,
            ..FakeEngine::ok()
        };
        let (_dir, runner, blobs) = setup(engine).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();

        let id = runner
            .store
            .create(source, vec![text_overlay("t1")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("FFprobe"));
    }

    #[tokio::test]
    async fn test_missing_overlay_media_fails_before_render() {
        let (_dir, runner, blobs) = setup(FakeEngine::ok()).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();

        let id = runner
            .store
            .create(source, vec![image_overlay("i1", "overlays/missing.png")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("overlays/missing.png"));
    }

    #[tokio::test]
    async fn test_aux_media_resolved_and_passed_to_render() {
        let (_dir, runner, blobs) = setup(FakeEngine::ok()).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();
        blobs.store("overlays/logo.png", b"png").await.unwrap();

        let id = runner
            .store
            .create(source, vec![image_overlay("i1", "overlays/logo.png")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_silent_renderer_is_invariant_violation() {
        let engine = FakeEngine {
            write_output: false,
            ..FakeEngine::ok()
        };
        let (_dir, runner, blobs) = setup(engine).await;
        let source = blobs.store("uploads/a.mp4", b"vid").await.unwrap();

        let id = runner
            .store
            .create(source, vec![text_overlay("t1")])
            .await;
        runner.run(id.clone()).await;

        let job = runner.job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("Result file absent"));
    }

    #[tokio::test]
    async fn test_fifty_concurrent_jobs_all_reach_terminal_state() {
        let (_dir, runner, blobs) = setup(FakeEngine::ok()).await;

        let mut handles = Vec::new();
        for i in 0..50 {
            let key = format!("uploads/{}.mp4", i);
            let source = blobs.store(&key, b"vid").await.unwrap();
            let overlays = if i % 2 == 0 {
                vec![text_overlay("t1")]
            } else {
                Vec::new()
            };
            let id = runner.store.create(source, overlays).await;
            handles.push((id.clone(), runner.spawn(id)));
        }

        for (_, handle) in &mut handles {
            handle.await.unwrap();
        }

        assert_eq!(runner.store.len().await, 50);
        for (id, _) in &handles {
            let job = runner.job(id).await.unwrap();
            assert_eq!(job.status, JobStatus::Completed, "job {}", id);
        }
    }
}
