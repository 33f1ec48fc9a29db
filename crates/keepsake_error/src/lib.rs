//! Error types for the Keepsake gallery.
//!
//! This crate provides the foundation error types used throughout the Keepsake workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use keepsake_error::{KeepsakeResult, HttpError};
//!
//! fn fetch_data() -> KeepsakeResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collector;
mod config;
mod download;
mod error;
mod http;
mod server;

pub use collector::{CollectorError, CollectorErrorKind};
pub use config::ConfigError;
pub use download::{DownloadError, DownloadErrorKind};
pub use error::{KeepsakeError, KeepsakeErrorKind, KeepsakeResult};
pub use http::HttpError;
pub use server::{ServerError, ServerErrorKind};
