//! The image transfer workflow: pick an image, send it for background
//! removal, then preview, download or share the result.
pub mod image;
pub mod state;
pub mod transfer;

pub use self::image::{ImageSummary, ResultImage, SelectedFile, SourceImage};
pub use state::{WorkflowSnapshot, WorkflowStatus, WorkflowView};
pub use transfer::{ImageTransferWorkflow, TransferOutcome};

/// File name used for downloads and share attachments.
pub const RESULT_FILE_NAME: &str = "background-removed.png";
pub const FILE_TOO_LARGE_MESSAGE: &str = "File size should be less than 5MB for free API";
