//! Thin HTTP client for the remove.bg API.
//!
//! One call: `POST /v1.0/removebg` with the image as multipart field
//! `image_file` and the `X-Api-Key` header. Success returns the image bytes;
//! failures carry `{"errors": [{"title": ...}]}`.
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::BackgroundRemover;
use crate::config::Config;
use crate::error::{AppError, AppResult, TRANSFER_FAILED_MESSAGE};
use crate::workflow::image::SourceImage;

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const IMAGE_FIELD: &str = "image_file";

#[derive(Clone)]
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    title: Option<String>,
}

impl RemoveBgClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        RemoveBgClient { client: Client::new(), endpoint, api_key }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.remove_bg_url.clone(), config.api_key.clone())
    }

    /// Upload `bytes` and return the background-removed image.
    pub async fn remove_background_bytes(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> AppResult<Vec<u8>> {
        tracing::info!("Sending {} ({} bytes) to {}", file_name, bytes.len(), self.endpoint);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(AppError::HttpClient)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self.client.post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to removal service failed: {}", e);
                AppError::HttpClient(e)
            })?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(AppError::HttpClient)?;
            if body.is_empty() {
                tracing::error!("Removal service returned an empty image");
                return Err(AppError::transfer(TRANSFER_FAILED_MESSAGE));
            }
            tracing::info!("Received processed image ({} bytes)", body.len());
            Ok(body.to_vec())
        } else {
            let body = response.bytes().await.unwrap_or_default();
            let message = parse_error_title(&body).unwrap_or_else(|| TRANSFER_FAILED_MESSAGE.to_string());
            tracing::error!("Background removal failed. Status: {}, Message: {}", status, message);
            Err(AppError::Transfer(message))
        }
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, image: &SourceImage) -> AppResult<Vec<u8>> {
        self.remove_background_bytes(image.name(), image.mime(), image.bytes().to_vec()).await
    }
}

/// First error title from a remove.bg error body, if there is a usable one.
pub fn parse_error_title(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.errors
        .into_iter()
        .next()
        .and_then(|e| e.title)
        .filter(|title| !title.trim().is_empty())
}
