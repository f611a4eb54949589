//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::share::ShareOutcome;
use crate::workflow::{SelectedFile, WorkflowView, RESULT_FILE_NAME};

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "image";

pub async fn root() -> &'static str {
    "Background Remover"
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<WorkflowView> {
    Json(state.workflow.snapshot().await.view())
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<WorkflowView>> {
    let limit = state.workflow.max_upload_bytes();
    let mut selected = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("image").to_string();
        let mime = field.content_type().map(str::to_string);

        // Stop buffering once past the limit; the size alone is enough for
        // the workflow to reject the file.
        let mut bytes = Vec::new();
        let mut oversized = false;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > limit {
                oversized = true;
                break;
            }
        }
        selected = Some(if oversized {
            SelectedFile::declared(name, mime, bytes.len() as u64)
        } else {
            SelectedFile::from_bytes(name, mime, bytes)
        });
        break;
    }
    let file = selected.ok_or_else(|| AppError::BadRequest(format!("missing '{}' field", UPLOAD_FIELD)))?;

    state.workflow.accept_file(file).await?;
    Ok(Json(state.workflow.snapshot().await.view()))
}

pub async fn source_image(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let source = state.workflow.snapshot().await.source.ok_or(AppError::NotFound("source image"))?;
    Ok(([(header::CONTENT_TYPE, source.mime().to_string())], source.bytes().to_vec()).into_response())
}

/// The result as a browser download.
pub async fn result_image(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let result = state.workflow.snapshot().await.result.ok_or(AppError::NotFound("result image"))?;
    let disposition = format!("attachment; filename=\"{}\"", RESULT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, result.mime().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.bytes().to_vec(),
    )
        .into_response())
}

pub async fn remove_background(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let outcome = state.workflow.request_background_removal().await?;
    let view = state.workflow.snapshot().await.view();
    Ok(Json(json!({ "outcome": outcome, "workflow": view })))
}

/// Save the result into the configured output directory.
pub async fn download(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let saved = state.workflow.download_result(&state.output_dir).await?;
    Ok(Json(json!({ "path": saved.map(|p| p.display().to_string()) })))
}

pub async fn share(State(state): State<Arc<AppState>>) -> Json<ShareOutcome> {
    Json(state.workflow.share_result().await)
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Json<WorkflowView> {
    state.workflow.reset().await;
    Json(state.workflow.snapshot().await.view())
}
