//! Errors raised while forwarding events to the external collector.
//!
//! These never reach application code: the logger swallows them. They exist so
//! collector implementations can report what went wrong to tests and to their
//! own debug output.

/// Collector failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CollectorErrorKind {
    /// No async runtime was available to ship the event
    #[display("No runtime available to deliver event")]
    NoRuntime,

    /// The event could not be serialized
    #[display("Failed to encode event: {}", _0)]
    Encode(String),

    /// The collector endpoint rejected or did not receive the event
    #[display("Delivery failed: {}", _0)]
    Delivery(String),

    /// The collector panicked while handling the event
    #[display("Collector panicked")]
    Panicked,
}

/// Collector error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Collector Error: {} at line {} in {}", kind, line, file)]
pub struct CollectorError {
    /// The error kind
    pub kind: CollectorErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl CollectorError {
    /// Create a new CollectorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CollectorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
