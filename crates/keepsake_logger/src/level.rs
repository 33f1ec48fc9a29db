//! Log severity.

use serde::{Deserialize, Serialize};

/// Severity of a log call.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail
    #[display("debug")]
    Debug,
    /// Normal operation
    #[display("info")]
    Info,
    /// Something unexpected but recoverable
    #[display("warn")]
    Warn,
    /// A failure
    #[display("error")]
    Error,
}

impl LogLevel {
    /// Upper-case label used in console lines.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}
