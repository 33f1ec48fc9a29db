//! Error types for the download proxy service.

/// Error kinds for server operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ServerErrorKind {
    /// Binding the listen address failed
    #[display("Failed to bind {}: {}", address, reason)]
    Bind {
        /// Address that could not be bound
        address: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// The server loop exited with an error
    #[display("Server terminated: {}", _0)]
    Serve(String),

    /// The outbound HTTP client could not be constructed
    #[display("HTTP client setup failed: {}", _0)]
    Client(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Server Error: {} at line {} in {}", kind, line, file)]
pub struct ServerError {
    /// The error kind
    pub kind: ServerErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl ServerError {
    /// Create a new ServerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
