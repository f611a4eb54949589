//! Native share seam.
//!
//! A host either offers a `ShareTarget` or it does not; the workflow turns
//! the missing case into a one-time notice. `CommandShare` hands the image to
//! an external program, which is how a desktop or shell host exposes its
//! share sheet.
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::error::{AppError, AppResult};

pub const SHARE_TITLE: &str = "Background Removed Image";
pub const SHARE_MIME_TYPE: &str = "image/png";

/// File attachment plus title handed to the share target.
#[derive(Debug, Clone)]
pub struct SharePayload {
    pub title: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum ShareOutcome {
    /// Nothing to share yet.
    Skipped,
    Shared,
    /// The host has no share capability; the message is shown once.
    Unsupported(String),
    /// The share target failed; already logged.
    Failed,
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> AppResult<()>;
}

/// Runs `program args.. <file>` with the attachment written to a temp dir.
///
/// `SHARE_TITLE` and `SHARE_MIME_TYPE` are passed in the environment.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
}

impl CommandShare {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandShare { program: program.into(), args }
    }

    /// Parse a whitespace separated command line such as `xdg-open` or
    /// `notify-send --icon`.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandShare::new(program, parts.collect()))
    }
}

#[async_trait]
impl ShareTarget for CommandShare {
    async fn share(&self, payload: &SharePayload) -> AppResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(&payload.file_name);
        tokio::fs::write(&path, payload.bytes.as_slice()).await?;

        tracing::debug!("Running share command {} for {}", self.program, path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .env("SHARE_TITLE", &payload.title)
            .env("SHARE_MIME_TYPE", &payload.mime)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| AppError::Share(format!("could not run {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Share(format!("{} exited with {}", self.program, status)))
        }
    }
}
