//! The workflow itself.
//!
//! State lives behind an async mutex that is never held across the decode or
//! the network call. Every operation that makes earlier work obsolete bumps
//! `epoch`; a decode or transfer that finishes under a different epoch is
//! dropped instead of applied.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinError;

use super::image::{ResultImage, SelectedFile, SourceImage, UNSUPPORTED_IMAGE_MESSAGE};
use super::state::{Stage, WorkflowSnapshot, WorkflowStatus};
use super::{FILE_TOO_LARGE_MESSAGE, RESULT_FILE_NAME};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{AppError, AppResult};
use crate::removebg::BackgroundRemover;
use crate::share::{ShareOutcome, SharePayload, ShareTarget, SHARE_MIME_TYPE, SHARE_TITLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// No source image loaded, nothing was sent.
    NoSource,
    /// A newly selected file is still loading, nothing was sent.
    LoadPending,
    Completed,
    /// The workflow was reset or given a new image while the request ran.
    Discarded,
}

#[derive(Default)]
struct Inner {
    stage: Stage,
    error: Option<String>,
    epoch: u64,
}

impl Inner {
    fn advance(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

pub struct ImageTransferWorkflow {
    remover: Arc<dyn BackgroundRemover>,
    share_target: Option<Arc<dyn ShareTarget>>,
    max_upload_bytes: u64,
    inner: Mutex<Inner>,
}

impl ImageTransferWorkflow {
    pub fn new(remover: Arc<dyn BackgroundRemover>) -> Self {
        ImageTransferWorkflow {
            remover,
            share_target: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_share_target(mut self, target: Arc<dyn ShareTarget>) -> Self {
        self.share_target = Some(target);
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.inner.lock().await;
        WorkflowSnapshot {
            status: inner.stage.status(inner.error.is_some()),
            error: inner.error.clone(),
            source: inner.stage.source().cloned(),
            result: inner.stage.result().cloned(),
        }
    }

    pub async fn status(&self) -> WorkflowStatus {
        let inner = self.inner.lock().await;
        inner.stage.status(inner.error.is_some())
    }

    /// Validate and load a newly selected file as the source image.
    ///
    /// A rejected file only sets the error message. An accepted one clears the
    /// error and any result straight away, then becomes the source once it
    /// has been read and decoded.
    pub async fn accept_file(&self, file: SelectedFile) -> AppResult<()> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if let Err(e) = self.validate(&file) {
                tracing::warn!("Rejected {} ({} bytes): {}", file.name(), file.size(), e);
                inner.error = Some(e.user_message());
                return Err(e);
            }
            inner.error = None;
            inner.stage = inner.stage.begin_loading();
            inner.advance()
        };

        let loaded = match file.read().await {
            Ok((name, bytes)) => {
                settle_decode(tokio::task::spawn_blocking(move || SourceImage::decode(name, bytes)).await)
            }
            Err(e) => Err(e),
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            tracing::warn!("Discarding a file load superseded by a newer selection or reset");
            return Ok(());
        }
        match loaded {
            Ok(source) => {
                let (width, height) = source.dimensions();
                tracing::info!(
                    "Loaded {} as source {} ({}, {}x{}, {} bytes)",
                    source.name(), source.id(), source.mime(), width, height, source.bytes().len()
                );
                inner.stage = Stage::Loaded { source: Arc::new(source) };
                inner.advance();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not load selected file: {}", e);
                inner.stage = inner.stage.abandon_loading();
                inner.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    fn validate(&self, file: &SelectedFile) -> AppResult<()> {
        if file.size() > self.max_upload_bytes {
            return Err(AppError::validation(size_limit_message(self.max_upload_bytes)));
        }
        match file.declared_mime() {
            Some(mime) if !mime.starts_with("image/") => {
                Err(AppError::validation(super::image::NOT_AN_IMAGE_MESSAGE))
            }
            _ => Ok(()),
        }
    }

    /// Send the source image to the removal service and store the result.
    ///
    /// Without a source this does nothing. While a request is in flight a
    /// second one is refused. The request cannot be cancelled; if the
    /// workflow moves on meanwhile, its response is dropped.
    pub async fn request_background_removal(&self) -> AppResult<TransferOutcome> {
        let (source, epoch) = {
            let mut inner = self.inner.lock().await;
            let source = match &inner.stage {
                Stage::Idle => return Ok(TransferOutcome::NoSource),
                Stage::Loading { .. } => return Ok(TransferOutcome::LoadPending),
                Stage::Processing { .. } => return Err(AppError::TransferInProgress),
                Stage::Loaded { source } | Stage::Completed { source, .. } => source.clone(),
            };
            inner.stage = Stage::Processing { source: source.clone() };
            inner.error = None;
            (source, inner.epoch)
        };

        tracing::info!("Removing background from source {}", source.id());
        let outcome = self.remover.remove_background(&source).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            tracing::warn!("Discarding removal response for superseded source {}", source.id());
            return Ok(TransferOutcome::Discarded);
        }
        match outcome {
            Ok(bytes) => {
                let result = ResultImage::from_bytes(bytes);
                tracing::info!("Background removed for source {} ({} bytes)", source.id(), result.bytes().len());
                inner.stage = Stage::Completed { source, result: Arc::new(result) };
                Ok(TransferOutcome::Completed)
            }
            Err(e) => {
                tracing::error!("Error removing background: {}", e);
                inner.stage = Stage::Loaded { source };
                inner.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Save the result as `background-removed.png` inside `dir`.
    pub async fn download_result(&self, dir: impl AsRef<Path>) -> AppResult<Option<PathBuf>> {
        let result = match self.inner.lock().await.stage.result().cloned() {
            Some(result) => result,
            None => return Ok(None),
        };
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(RESULT_FILE_NAME);
        tokio::fs::write(&path, result.bytes()).await?;
        tracing::info!("Saved {} ({} bytes)", path.display(), result.bytes().len());
        Ok(Some(path))
    }

    /// Hand the result to the host's share target. Share failures are only
    /// logged; they never touch the error message.
    pub async fn share_result(&self) -> ShareOutcome {
        let result = match self.inner.lock().await.stage.result().cloned() {
            Some(result) => result,
            None => return ShareOutcome::Skipped,
        };
        let target = match &self.share_target {
            Some(target) => target,
            None => return ShareOutcome::Unsupported(AppError::ShareUnsupported.to_string()),
        };
        let payload = SharePayload {
            title: SHARE_TITLE.to_string(),
            file_name: RESULT_FILE_NAME.to_string(),
            mime: SHARE_MIME_TYPE.to_string(),
            bytes: Arc::new(result.bytes().to_vec()),
        };
        match target.share(&payload).await {
            Ok(()) => {
                tracing::info!("Shared {}", payload.file_name);
                ShareOutcome::Shared
            }
            Err(e) => {
                tracing::error!("Error sharing: {}", e);
                ShareOutcome::Failed
            }
        }
    }

    /// Back to an empty workflow. Pending loads and transfers are not
    /// cancelled, but their results will be ignored.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.stage = Stage::Idle;
        inner.error = None;
        inner.advance();
        tracing::debug!("Workflow reset");
    }
}

fn settle_decode(joined: Result<AppResult<SourceImage>, JoinError>) -> AppResult<SourceImage> {
    joined.unwrap_or_else(|e| {
        tracing::error!("Image decoding task failed: {}", e);
        Err(AppError::validation(UNSUPPORTED_IMAGE_MESSAGE))
    })
}

fn size_limit_message(limit: u64) -> String {
    if limit == DEFAULT_MAX_UPLOAD_BYTES {
        FILE_TOO_LARGE_MESSAGE.to_string()
    } else {
        format!("File size should be less than {} bytes", limit)
    }
}
