//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, result, root, status, upload};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.max_body_size;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/status/:job_id", get(status))
        .route("/result/:job_id", get(result))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
