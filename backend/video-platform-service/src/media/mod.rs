/// Object storage for uploaded media
///
/// Handlers spool multipart files to a temporary directory; an uploader forwards a
/// spooled file to object storage and removes the local copy whatever the outcome.
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod cloudinary;

pub use cloudinary::CloudinaryUploader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn resource_type(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Stored media as reported by object storage
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    /// Seconds, present for video uploads
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("object storage is not configured")]
    NotConfigured,

    #[error("failed to read spooled upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("object storage rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload the file at `path`. The local file is removed afterwards.
    async fn upload(&self, path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError>;
}

/// Round to two decimals, the precision durations are stored with.
pub fn round_duration(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_keep_two_decimals() {
        assert_eq!(round_duration(12.3456), 12.35);
        assert_eq!(round_duration(0.0), 0.0);
    }
}
