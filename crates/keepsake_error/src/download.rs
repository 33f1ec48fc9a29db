//! Media download error types.

/// Why a media download failed.
///
/// The `Display` text of each kind is what clients see in error bodies, so it
/// carries no location information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DownloadErrorKind {
    /// The request did not name a source URL
    #[display("Missing URL parameter")]
    MissingUrl,

    /// The upstream object store answered with a non-success status
    #[display("Failed to fetch file: {} {}", status, reason)]
    Upstream {
        /// HTTP status code returned upstream
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// The upstream could not be reached
    #[display("{}", _0)]
    Network(String),

    /// The response body could not be read in full
    #[display("Failed to read response body: {}", _0)]
    Body(String),

    /// Writing the downloaded file locally failed
    #[display("Failed to save file: {}", _0)]
    Io(String),
}

/// Download error with location tracking.
///
/// # Examples
///
/// ```
/// use keepsake_error::{DownloadError, DownloadErrorKind};
///
/// let err = DownloadError::new(DownloadErrorKind::Upstream {
///     status: 404,
///     reason: "Not Found".to_string(),
/// });
/// assert_eq!(err.kind.to_string(), "Failed to fetch file: 404 Not Found");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Download Error: {} at line {} in {}", kind, line, file)]
pub struct DownloadError {
    /// The kind of failure
    pub kind: DownloadErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl DownloadError {
    /// Create a new download error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DownloadErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Message suitable for an error response body.
    pub fn public_message(&self) -> String {
        self.kind.to_string()
    }
}
