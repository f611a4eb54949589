//! Common error type and alias.
//!
//! `AppError` covers both the user-facing failures of the workflow (rejected
//! files, failed transfers, share problems) and the plumbing errors that can
//! surface underneath them. `user_message` maps any of them to the inline
//! message the workflow stores.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Fallback shown when the service gives no usable reason for a failure.
pub const TRANSFER_FAILED_MESSAGE: &str = "Background removal failed. Please try again.";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// The selected file was rejected before anything was loaded.
    #[error("{0}")]
    Validation(String),

    /// The removal service reported a failure.
    #[error("{0}")]
    Transfer(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("A background removal request is already in progress")]
    TransferInProgress,

    #[error("Sharing is not supported in this environment. You can download the image instead.")]
    ShareUnsupported,

    #[error("Share failed: {0}")]
    Share(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transfer<S: Into<String>>(msg: S) -> Self {
        Self::Transfer(msg.into())
    }

    /// Message suitable for the inline error slot of the workflow.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Transfer(msg) => msg.clone(),
            AppError::TransferInProgress | AppError::ShareUnsupported => self.to_string(),
            _ => TRANSFER_FAILED_MESSAGE.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transfer(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::TransferInProgress => StatusCode::CONFLICT,
            AppError::ShareUnsupported => StatusCode::NOT_IMPLEMENTED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Share(_) | AppError::Io(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::BadRequest(_) | AppError::NotFound(_) => self.to_string(),
            _ => self.user_message(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_keeps_service_reason() {
        let err = AppError::transfer("Insufficient credits");
        assert_eq!(err.user_message(), "Insufficient credits");
    }

    #[test]
    fn plumbing_errors_fall_back_to_generic_message() {
        let err = AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.user_message(), TRANSFER_FAILED_MESSAGE);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::validation("too big").into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::TransferInProgress.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NotFound("result image").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
