//! Download proxy for the Keepsake gallery.
//!
//! Browsers cannot force a download of a cross-origin object, so the gallery
//! asks this service instead: `GET /api/download/media?url=...&filename=...`
//! fetches the object and returns it with attachment headers.
//!
//! # Example
//!
//! ```no_run
//! use keepsake_core::Environment;
//! use keepsake_logger::{Logger, NoopCollector};
//! use keepsake_server::{AppState, ReqwestFetcher, serve, shutdown_signal};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Arc::new(Logger::new(Environment::Development, Arc::new(NoopCollector)));
//! let state = AppState::new(logger, Arc::new(ReqwestFetcher::new()?));
//! serve("127.0.0.1:8080", state, shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod encoding;
mod fetch;
mod server;

pub use api::{AppState, DownloadQuery, create_router};
pub use encoding::{attachment_disposition, encode_uri_component};
pub use fetch::{MediaFetcher, ReqwestFetcher};
pub use server::{serve, shutdown_signal};
