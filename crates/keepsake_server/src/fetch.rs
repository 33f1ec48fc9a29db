//! Upstream object retrieval.

use async_trait::async_trait;
use axum::body::Bytes;
use keepsake_error::{DownloadError, DownloadErrorKind, ServerError, ServerErrorKind};
use tracing::{debug, instrument};

/// Retrieves an object's full body.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError>;
}

/// [`MediaFetcher`] backed by `reqwest`.
///
/// One request per call, no retries. The body is buffered in memory.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with a default client.
    pub fn new() -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ServerError::new(ServerErrorKind::Client(e.to_string())))?;
        Ok(Self { client })
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaFetcher for ReqwestFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError> {
        let response = self
            .client
            .get(url)
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
        debug!(bytes = body.len(), "Fetched upstream object");
        Ok(body)
    }
}
