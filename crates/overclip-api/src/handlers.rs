//! Request handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

use overclip_models::{validate_overlays, JobId, JobStatus, OverlayDescriptor};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /`
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Overclip API is running",
        "status": "healthy"
    }))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /upload` — multipart `video` file plus `overlays` JSON field.
///
/// Validation failures are synchronous; on success the job is created
/// PENDING and its executor is spawned fire-and-forget.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let mut video: Option<(String, Vec<u8>)> = None;
    let mut overlays_json: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("video") => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "upload.mp4".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Cannot read video: {}", e)))?;
                video = Some((filename, bytes.to_vec()));
            }
            Some("overlays") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Cannot read overlays: {}", e)))?;
                overlays_json = Some(text);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        video.ok_or_else(|| ApiError::bad_request("Missing 'video' file field"))?;
    let overlays_json =
        overlays_json.ok_or_else(|| ApiError::bad_request("Missing 'overlays' field"))?;

    let overlays: Vec<OverlayDescriptor> = serde_json::from_str(&overlays_json)
        .map_err(|e| ApiError::bad_request(format!("Invalid overlay metadata: {}", e)))?;
    validate_overlays(&overlays)?;

    let key = format!("uploads/{}_{}", Uuid::new_v4(), filename);
    let source = state.blobs.store(&key, &bytes).await?;

    let id = state.store.create(source, overlays).await;
    state.runner.spawn(id.clone());
    info!(job_id = %id, upload = %key, "Job submitted");

    Ok(Json(json!({
        "job_id": id,
        "status": JobStatus::Pending
    })))
}

/// Status payload: `completed_at` only once terminal, `error` only when
/// failed.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /status/:job_id`
pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job = state.store.get(&JobId::from_string(job_id)).await?;

    Ok(Json(StatusResponse {
        job_id: job.id,
        status: job.status,
        completed_at: job.status.is_terminal().then_some(job.completed_at).flatten(),
        error: match job.status {
            JobStatus::Failed => job.error,
            _ => None,
        },
        created_at: job.created_at,
    }))
}

/// `GET /result/:job_id` — streams the rendered video once COMPLETED.
pub async fn result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id = JobId::from_string(job_id);
    let job = state.store.get(&id).await?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::bad_request(format!(
            "Job is not completed yet. Current status: {}",
            job.status
        )));
    }

    let result = job
        .result
        .ok_or_else(|| ApiError::internal("Completed job has no result ref"))?;
    let file = state
        .blobs
        .open(&result)
        .await
        .map_err(|_| ApiError::internal("Result file not found"))?;

    let stream = ReaderStream::new(file);
    let response = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}_result.mp4\"", id),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(response)
}

/// Keep only the final path component and drop shell-hostile characters.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload.mp4".to_string()
    } else {
        cleaned
    }
}
