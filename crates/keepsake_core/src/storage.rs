//! Object-storage URL resolution.

use crate::StorageSettings;
use tracing::warn;

/// Turns stored object keys into fetchable URLs.
///
/// Keys are served through the CDN when one is configured, with the upload
/// prefix removed because the CDN origin already points inside it. Without a
/// CDN the direct S3 virtual-hosted URL is used.
///
/// # Examples
///
/// ```
/// use keepsake_core::{MediaUrlResolver, StorageSettings};
///
/// let settings = StorageSettings::default().with_cdn_domain("d111.cloudfront.net".to_string());
/// let resolver = MediaUrlResolver::new(settings);
/// assert_eq!(
///     resolver.resolve("henna-uploads/photos/a.jpg"),
///     "https://d111.cloudfront.net/photos/a.jpg"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrlResolver {
    settings: StorageSettings,
}

impl MediaUrlResolver {
    /// Create a resolver from storage settings.
    pub fn new(settings: StorageSettings) -> Self {
        Self { settings }
    }

    /// Public URL for `key`.
    pub fn resolve(&self, key: &str) -> String {
        match self.settings.cdn_domain().as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => {
                let key = key.replacen(self.settings.key_prefix().as_str(), "", 1);
                format!("https://{}/{}", domain, key)
            }
            None => {
                warn!("CDN domain not configured, falling back to S3");
                self.s3_url(key)
            }
        }
    }

    /// Direct bucket URL for `key`.
    pub fn s3_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.settings.bucket().as_deref().unwrap_or_default(),
            self.settings.region().as_deref().unwrap_or_default(),
            key
        )
    }
}
