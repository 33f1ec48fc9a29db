//! Payloads delivered to the external collector.

use crate::{LogContext, LogLevel};
use chrono::{DateTime, Utc};
use keepsake_core::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Timestamped trail entry attached to collector events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Breadcrumb {
    /// Log message that produced the entry
    message: String,
    /// Level of that message
    level: LogLevel,
    /// When it was logged
    timestamp: DateTime<Utc>,
}

impl Breadcrumb {
    /// Create a breadcrumb stamped with the current time.
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: Utc::now(),
        }
    }
}

/// An error reported alongside an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ExceptionReport {
    /// `Display` output of the error
    message: String,
    /// `Display` output of each `source()` in order
    causes: Vec<String>,
}

impl ExceptionReport {
    /// Capture an error and its source chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            causes,
        }
    }
}

/// User identity attached to events, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct UserContext {
    /// Stable user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Browser or client session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

impl UserContext {
    /// Create a user context.
    pub fn new(id: Option<String>, session_id: Option<String>) -> Self {
        Self { id, session_id }
    }
}

/// One structured event as the collector receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct CollectorEvent {
    /// Unique event identifier
    event_id: Uuid,
    /// When the event was logged
    timestamp: DateTime<Utc>,
    /// Severity
    level: LogLevel,
    /// Log message
    message: String,
    /// Scope tags merged with the call's context
    tags: BTreeMap<String, String>,
    /// Recent log trail, oldest first, ending with this call
    breadcrumbs: Vec<Breadcrumb>,
    /// Error being reported, for `error` calls that carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exception: Option<ExceptionReport>,
    /// Original structured context
    context: LogContext,
    /// Deployment environment
    environment: Environment,
    /// Identity of the current user, when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserContext>,
}

impl CollectorEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        level: LogLevel,
        message: String,
        tags: BTreeMap<String, String>,
        breadcrumbs: Vec<Breadcrumb>,
        exception: Option<ExceptionReport>,
        context: LogContext,
        environment: Environment,
        user: Option<UserContext>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message,
            tags,
            breadcrumbs,
            exception,
            context,
            environment,
            user,
        }
    }
}

/// How a traced operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum SpanStatus {
    /// Completed normally
    Success,
    /// Returned an error with this message
    Error(String),
}

/// A finished span as the collector receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct SpanRecord {
    /// Operation category (`http.client`, `file.upload`, `ui.action`)
    op: String,
    /// Span name
    name: String,
    /// Context recorded as span attributes
    attributes: LogContext,
    /// When the operation started
    started_at: DateTime<Utc>,
    /// How long it ran, in milliseconds
    duration_ms: u64,
    /// Outcome
    status: SpanStatus,
}

impl SpanRecord {
    /// Create a span record.
    pub fn new(
        op: impl Into<String>,
        name: impl Into<String>,
        attributes: LogContext,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        status: SpanStatus,
    ) -> Self {
        Self {
            op: op.into(),
            name: name.into(),
            attributes,
            started_at,
            duration_ms,
            status,
        }
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.status == SpanStatus::Success
    }
}
