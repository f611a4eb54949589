//! Shared state and router construction.
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::workflow::ImageTransferWorkflow;

pub struct AppState {
    pub workflow: ImageTransferWorkflow,
    pub output_dir: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    // Uploads stop being read once past the upload limit, so this only caps
    // requests that pile up other fields before the image.
    let body_limit = usize::try_from(state.workflow.max_upload_bytes().saturating_mul(4))
        .unwrap_or(usize::MAX)
        .saturating_add(64 * 1024);

    Router::new()
        .route("/", get(handlers::root))
        .route("/status", get(handlers::status))
        .route("/image", post(handlers::upload_image))
        .route("/image/source", get(handlers::source_image))
        .route("/image/result", get(handlers::result_image))
        .route("/remove", post(handlers::remove_background))
        .route("/download", post(handlers::download))
        .route("/share", post(handlers::share))
        .route("/reset", post(handlers::reset))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
