//! Structured logging for the Keepsake gallery.
//!
//! [`Logger`] prints formatted lines to the console in development and forwards
//! structured events to an external error/trace collector in production. It is
//! handed to components as an `Arc<dyn StructuredLog>` so tests can substitute
//! their own sink.
//!
//! # Features
//!
//! - **Leveled logging**: `debug`, `info`, `warn`, `error` plus formatting helpers
//!   (`api_request`, `user_action`, `upload_progress`, ...)
//! - **Collectors**: HTTP forwarding, in-memory capture, no-op
//! - **Span tracing**: [`trace_api_call`], [`trace_upload`], [`trace_user_action`]
//! - **Subscriber setup**: [`init_observability`] wires `tracing` to the console
//!   and OpenTelemetry
//!
//! Logging never fails the caller: collector errors and panics are swallowed.
//!
//! # Example
//!
//! ```
//! use keepsake_core::Environment;
//! use keepsake_logger::{LogContext, Logger, MemoryCollector, StructuredLog};
//! use std::sync::Arc;
//!
//! let collector = Arc::new(MemoryCollector::new());
//! let logger = Logger::new(Environment::Production, collector.clone());
//!
//! logger.user_action("Opened gallery", LogContext::new().with("mediaCount", 42));
//!
//! let events = collector.events();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].message(), "User Action: Opened gallery");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collector;
mod context;
mod event;
mod level;
mod logger;
mod observability;
mod span;

pub use collector::{Collector, HttpCollector, MemoryCollector, NoopCollector};
pub use context::LogContext;
pub use event::{Breadcrumb, CollectorEvent, ExceptionReport, SpanRecord, SpanStatus, UserContext};
pub use level::LogLevel;
pub use logger::{Logger, StructuredLog, install_panic_hook};
pub use observability::{ObservabilityConfig, ObservabilityGuard, init_observability};
pub use span::{trace_api_call, trace_upload, trace_user_action};
