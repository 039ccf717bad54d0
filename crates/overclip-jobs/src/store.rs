//! Concurrency-safe job map with enforced transitions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use overclip_models::{BlobRef, Job, JobId, JobStatus, OverlayDescriptor};

use crate::error::{JobError, JobResult};

/// Shared map of job id to job record.
///
/// Cloning is cheap; all clones view the same map. Mutators enforce the
/// one-directional lifecycle and fire exactly once per job in normal flow;
/// out-of-order calls are rejected rather than silently applied.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job and return its id.
    pub async fn create(&self, source: BlobRef, overlays: Vec<OverlayDescriptor>) -> JobId {
        let job = Job::new(source, overlays);
        let id = job.id.clone();
        self.inner.write().await.insert(id.clone(), job);
        info!(job_id = %id, "Job created");
        id
    }

    /// Fetch a snapshot of a job record.
    pub async fn get(&self, id: &JobId) -> JobResult<Job> {
        self.inner
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// Transition `Pending -> Processing`.
    pub async fn mark_processing(&self, id: &JobId) -> JobResult<()> {
        self.transition(id, JobStatus::Processing, |job| {
            job.status = JobStatus::Processing;
        })
        .await
    }

    /// Transition `Processing -> Completed` with the result ref.
    pub async fn mark_completed(&self, id: &JobId, result: BlobRef) -> JobResult<()> {
        self.transition(id, JobStatus::Completed, |job| {
            job.status = JobStatus::Completed;
            job.result = Some(result);
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Transition `Processing -> Failed` with a human-readable reason.
    pub async fn mark_failed(&self, id: &JobId, reason: impl Into<String>) -> JobResult<()> {
        let reason = reason.into();
        self.transition(id, JobStatus::Failed, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(reason);
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Number of stored jobs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Apply a mutation after checking the transition is legal.
    async fn transition<F>(&self, id: &JobId, to: JobStatus, apply: F) -> JobResult<()>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.inner.write().await;
        let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;

        let legal = matches!(
            (job.status, to),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        );
        if !legal {
            return Err(JobError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to,
            });
        }

        apply(job);
        info!(job_id = %id, status = %to, "Job transitioned");
        Ok(())
    }
}
