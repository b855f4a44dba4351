//! Media hosting
//!
//! Multipart files are staged to a temp directory, then pushed to a
//! Cloudinary-compatible unsigned upload endpoint. Upload failures are logged
//! and reported as `None`; callers decide whether that is fatal.

use crate::config::MediaConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// A hosted media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
}

/// External media host
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload a local file. `None` on any failure.
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia>;
}

/// Upload response fields we read
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Cloudinary-style unsigned uploads over HTTP
pub struct CloudinaryUploader {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryUploader {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            upload_preset: config.upload_preset.clone(),
        })
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        let bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %local_path.display(), "Cannot read staged file: {}", e);
                return None;
            }
        };

        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("upload_preset", self.upload_preset.clone());

        let response = match self.client.post(&self.upload_url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Media upload request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Media host rejected upload");
            return None;
        }

        match response.json::<UploadResponse>().await {
            Ok(body) => body.secure_url.or(body.url).map(|url| {
                debug!(url = %url, "Uploaded media");
                UploadedMedia { url }
            }),
            Err(e) => {
                warn!("Unreadable media upload response: {}", e);
                None
            }
        }
    }
}

/// Uploader used when no media host is configured; every upload fails.
pub struct DisabledMediaUploader;

#[async_trait]
impl MediaUploader for DisabledMediaUploader {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        warn!(path = %local_path.display(), "Media uploads are disabled");
        None
    }
}

/// Uploader for the configured host, or [`DisabledMediaUploader`] when no
/// upload URL is set
pub fn uploader_from_config(config: &MediaConfig) -> Result<Arc<dyn MediaUploader>> {
    if config.upload_url.trim().is_empty() {
        warn!("No media upload URL configured. Uploads are disabled.");
        return Ok(Arc::new(DisabledMediaUploader));
    }
    Ok(Arc::new(CloudinaryUploader::new(config)?))
}

/// Write an uploaded file into the staging directory under a unique name
pub async fn stage_file(temp_dir: &Path, original_name: Option<&str>, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(temp_dir).await?;

    let suffix = original_name.map(sanitize_file_name).unwrap_or_default();
    let path = if suffix.is_empty() {
        temp_dir.join(Uuid::new_v4().to_string())
    } else {
        temp_dir.join(format!("{}-{}", Uuid::new_v4(), suffix))
    };

    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Remove staged files; already-missing files are fine.
pub async fn discard_staged(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove staged file: {}", e);
            }
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
