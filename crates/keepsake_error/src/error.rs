//! Top-level error wrapper types.

use crate::{CollectorError, ConfigError, DownloadError, HttpError, ServerError};

/// Every error condition in the Keepsake workspace.
///
/// # Examples
///
/// ```
/// use keepsake_error::{KeepsakeError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: KeepsakeError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum KeepsakeErrorKind {
    /// HTTP client error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Media download error
    #[from(DownloadError)]
    Download(DownloadError),
    /// Collector delivery error
    #[from(CollectorError)]
    Collector(CollectorError),
    /// Download proxy server error
    #[from(ServerError)]
    Server(ServerError),
}

/// Keepsake error with kind discrimination.
///
/// # Examples
///
/// ```
/// use keepsake_error::{KeepsakeResult, ConfigError};
///
/// fn might_fail() -> KeepsakeResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Keepsake Error: {}", _0)]
pub struct KeepsakeError(Box<KeepsakeErrorKind>);

impl KeepsakeError {
    /// Create a new error from a kind.
    pub fn new(kind: KeepsakeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &KeepsakeErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to KeepsakeErrorKind
impl<T> From<T> for KeepsakeError
where
    T: Into<KeepsakeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Keepsake operations.
pub type KeepsakeResult<T> = std::result::Result<T, KeepsakeError>;
