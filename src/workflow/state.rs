//! Workflow stages and the status derived from them.
use std::sync::Arc;

use serde::Serialize;

use super::image::{ImageSummary, ResultImage, SourceImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Idle,
    ImageLoaded,
    Processing,
    Completed,
    /// Nothing loaded and the last attempt to load something failed.
    Failed,
}

/// Where the workflow is. A result only exists next to its source.
#[derive(Debug, Clone, Default)]
pub(crate) enum Stage {
    #[default]
    Idle,
    /// A new file is being read and decoded; `source` is the one it replaces.
    Loading { source: Option<Arc<SourceImage>> },
    Loaded { source: Arc<SourceImage> },
    Processing { source: Arc<SourceImage> },
    Completed { source: Arc<SourceImage>, result: Arc<ResultImage> },
}

impl Stage {
    pub(crate) fn source(&self) -> Option<&Arc<SourceImage>> {
        match self {
            Stage::Idle => None,
            Stage::Loading { source } => source.as_ref(),
            Stage::Loaded { source } | Stage::Processing { source } | Stage::Completed { source, .. } => Some(source),
        }
    }

    pub(crate) fn result(&self) -> Option<&Arc<ResultImage>> {
        match self {
            Stage::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Result dropped, current source kept on display until the new one lands.
    pub(crate) fn begin_loading(&self) -> Stage {
        Stage::Loading { source: self.source().cloned() }
    }

    /// Back to the last settled source after a load failed.
    pub(crate) fn abandon_loading(&self) -> Stage {
        match self {
            Stage::Loading { source: Some(source) } => Stage::Loaded { source: source.clone() },
            Stage::Loading { source: None } => Stage::Idle,
            other => other.clone(),
        }
    }

    pub(crate) fn status(&self, has_error: bool) -> WorkflowStatus {
        match self {
            Stage::Idle | Stage::Loading { source: None } if has_error => WorkflowStatus::Failed,
            Stage::Idle | Stage::Loading { source: None } => WorkflowStatus::Idle,
            Stage::Loading { source: Some(_) } | Stage::Loaded { .. } => WorkflowStatus::ImageLoaded,
            Stage::Processing { .. } => WorkflowStatus::Processing,
            Stage::Completed { .. } => WorkflowStatus::Completed,
        }
    }
}

/// Point-in-time copy of the workflow for rendering.
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    pub status: WorkflowStatus,
    pub error: Option<String>,
    pub source: Option<Arc<SourceImage>>,
    pub result: Option<Arc<ResultImage>>,
}

impl WorkflowSnapshot {
    pub fn view(&self) -> WorkflowView {
        WorkflowView {
            status: self.status,
            error: self.error.clone(),
            source: self.source.as_ref().map(|s| s.summary()),
            result: self.result.as_ref().map(|r| r.summary()),
        }
    }
}

/// Serializable summary of a snapshot, without image bytes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WorkflowView {
    pub status: WorkflowStatus,
    pub error: Option<String>,
    pub source: Option<ImageSummary>,
    pub result: Option<ImageSummary>,
}
