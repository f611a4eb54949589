//! Selected files and the two image slots of the workflow.
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const UNSUPPORTED_IMAGE_MESSAGE: &str = "Selected file is not a supported image";
pub const NOT_AN_IMAGE_MESSAGE: &str = "Please select an image file";
const FALLBACK_RESULT_MIME: &str = "image/png";

enum FileContent {
    Disk(PathBuf),
    Memory(Vec<u8>),
    /// Only the size is known; the bytes were never kept.
    Unread,
}

/// A file picked by the user: its size and declared type are known up front,
/// the bytes are only read once the file passes validation.
pub struct SelectedFile {
    name: String,
    size: u64,
    declared_mime: Option<String>,
    content: FileContent,
}

impl SelectedFile {
    /// Describe a file on disk from its metadata, without reading it.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AppError::validation(format!("{} is not a file", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        // Extension-based, like a browser file picker.
        let declared_mime = ImageFormat::from_path(path)
            .ok()
            .map(|f| f.to_mime_type().to_string());
        Ok(SelectedFile {
            name,
            size: metadata.len(),
            declared_mime,
            content: FileContent::Disk(path.to_path_buf()),
        })
    }

    /// Wrap bytes that already arrived in memory, e.g. an HTTP upload.
    pub fn from_bytes(name: impl Into<String>, declared_mime: Option<String>, bytes: Vec<u8>) -> Self {
        SelectedFile {
            name: name.into(),
            size: bytes.len() as u64,
            declared_mime,
            content: FileContent::Memory(bytes),
        }
    }

    /// A file known only by its name, type and size, e.g. an upload that was
    /// cut off once it grew past the limit. It can be validated but not read.
    pub fn declared(name: impl Into<String>, declared_mime: Option<String>, size: u64) -> Self {
        SelectedFile {
            name: name.into(),
            size,
            declared_mime,
            content: FileContent::Unread,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    pub(crate) async fn read(self) -> AppResult<(String, Vec<u8>)> {
        let bytes = match self.content {
            FileContent::Disk(path) => tokio::fs::read(&path).await?,
            FileContent::Memory(bytes) => bytes,
            FileContent::Unread => {
                return Err(AppError::validation(format!("{} was not fully received", self.name)))
            }
        };
        Ok((self.name, bytes))
    }
}

/// The accepted upload, decoded far enough to know it is a displayable image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: Uuid,
    name: String,
    mime: String,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl SourceImage {
    /// Detect the encoding and read the dimensions. Runs header decoding, so
    /// call it off the async executor.
    pub fn decode(name: impl Into<String>, bytes: Vec<u8>) -> AppResult<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|_| AppError::validation(UNSUPPORTED_IMAGE_MESSAGE))?;
        let format = reader
            .format()
            .ok_or_else(|| AppError::validation(UNSUPPORTED_IMAGE_MESSAGE))?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            tracing::warn!("Rejecting {:?} upload: {}", format, e);
            AppError::validation(UNSUPPORTED_IMAGE_MESSAGE)
        })?;
        Ok(SourceImage {
            id: Uuid::new_v4(),
            name: name.into(),
            mime: format.to_mime_type().to_string(),
            width,
            height,
            bytes,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: Some(self.id),
            name: self.name.clone(),
            mime: self.mime.clone(),
            size: self.bytes.len(),
            width: Some(self.width),
            height: Some(self.height),
        }
    }
}

/// Bytes returned by the removal service.
#[derive(Debug, Clone)]
pub struct ResultImage {
    mime: String,
    bytes: Vec<u8>,
}

impl ResultImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(FALLBACK_RESULT_MIME)
            .to_string();
        ResultImage { mime, bytes }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: None,
            name: super::RESULT_FILE_NAME.to_string(),
            mime: self.mime.clone(),
            size: self.bytes.len(),
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub mime: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}
