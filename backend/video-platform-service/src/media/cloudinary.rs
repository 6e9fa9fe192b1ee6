/// Signed uploads to a Cloudinary-compatible endpoint
use super::{round_duration, MediaError, MediaKind, MediaUploader, UploadedMedia};
use crate::config::MediaConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    duration: Option<f64>,
}

pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryUploader {
    pub fn new(config: MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn is_configured(&self) -> bool {
        !self.config.cloud_name.is_empty()
            && !self.config.api_key.is_empty()
            && !self.config.api_secret.is_empty()
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.upload_url.trim_end_matches('/'),
            self.config.cloud_name,
            kind.resource_type()
        )
    }

    async fn send(&self, path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        if !self.is_configured() {
            return Err(MediaError::NotConfigured);
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let timestamp = chrono::Utc::now().timestamp();

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", sign(timestamp, &self.config.api_secret));

        let response = self
            .client
            .post(self.endpoint(kind))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        Ok(UploadedMedia {
            url: body.secure_url,
            duration: body.duration.map(round_duration),
        })
    }
}

/// Request signature: hex SHA-1 over the signed parameters followed by the secret.
fn sign(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("timestamp={timestamp}{api_secret}").as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        let result = self.send(path, kind).await;

        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove spooled upload");
        }

        match &result {
            Ok(media) => debug!(url = %media.url, kind = kind.resource_type(), "media uploaded"),
            Err(e) => warn!(error = %e, kind = kind.resource_type(), "media upload failed"),
        }
        result
    }
}
