//! Background removal service seam and its remove.bg implementation.
pub mod client;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::workflow::image::SourceImage;

/// Anything that can turn a source image into a background-removed image.
///
/// Failures the user should see are reported as `AppError::Transfer` with
/// the message to display; any other error is shown as the generic fallback.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: &SourceImage) -> AppResult<Vec<u8>>;
}
