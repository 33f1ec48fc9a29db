//! Saving media to the guest's device.

use async_trait::async_trait;
use keepsake_core::MediaItem;
use keepsake_error::{DownloadError, DownloadErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A file written by a downloader.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct SavedMedia {
    /// Where the file landed
    path: PathBuf,
    /// Bytes written
    bytes: u64,
}

impl SavedMedia {
    /// Describe a saved file.
    pub fn new(path: impl Into<PathBuf>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// Fetches an item's bytes and stores them for the guest.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `item`.
    async fn download(&self, item: &MediaItem) -> Result<SavedMedia, DownloadError>;
}

/// Downloads through the `/download/media` proxy endpoint and writes files
/// into a directory.
///
/// Going through the proxy sidesteps cross-origin restrictions on the object
/// store and forces an attachment response.
#[derive(Debug, Clone)]
pub struct ProxyDownloader {
    client: reqwest::Client,
    api_base: String,
    target_dir: PathBuf,
}

impl ProxyDownloader {
    /// Create a downloader for the API at `api_base` (e.g.
    /// `https://gallery.example.com/api`), saving into `target_dir`.
    pub fn new(api_base: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base, target_dir)
    }

    /// Create a downloader with a preconfigured client.
    pub fn with_client(
        client: reqwest::Client,
        api_base: impl Into<String>,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            target_dir: target_dir.into(),
        }
    }

    /// Proxy endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/download/media", self.api_base)
    }

    /// Directory files are saved into.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

/// Strip path separators so a title cannot escape the target directory.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "download".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[async_trait]
impl MediaDownloader for ProxyDownloader {
    #[instrument(skip(self, item), fields(media_id = %item.id()))]
    async fn download(&self, item: &MediaItem) -> Result<SavedMedia, DownloadError> {
        let filename = item.suggested_filename();
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("url", item.media_url().as_str()), ("filename", filename.as_str())])
            .send()
            .await
            .map_err(|e| DownloadError::new(DownloadErrorKind::Network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(DownloadErrorKind::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::new(DownloadErrorKind::Body(e.to_string())))?;

        let path = self.target_dir.join(safe_file_name(&filename));
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| DownloadError::new(DownloadErrorKind::Io(e.to_string())))?;

        debug!(path = %path.display(), bytes = body.len(), "Saved media");
        Ok(SavedMedia::new(path, body.len() as u64))
    }
}
