//! Background remover library
//!
//! Modules:
//! - `workflow`: The image transfer workflow (select, remove, download, share, reset).
//! - `removebg`: `BackgroundRemover` seam and the remove.bg HTTP client.
//! - `share`: Native share seam and the command based share target.
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `RemoveBgClient`,
//! `ImageTransferWorkflow`, and `SelectedFile`.
pub mod api;
pub mod config;
pub mod error;
pub mod removebg;
pub mod share;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use removebg::client::RemoveBgClient;
pub use workflow::{ImageTransferWorkflow, SelectedFile};

use std::sync::Arc;

/// Build a workflow wired to remove.bg and, when configured, a share command.
pub fn workflow_from_config(config: &Config) -> ImageTransferWorkflow {
    let workflow = ImageTransferWorkflow::new(Arc::new(RemoveBgClient::from_config(config)))
        .with_max_upload_bytes(config.max_upload_bytes);
    match config.share_command.as_deref().and_then(share::CommandShare::parse) {
        Some(share) => workflow.with_share_target(Arc::new(share)),
        None => workflow,
    }
}
