//! Span helpers for timing operations.
//!
//! Each helper opens a `tracing` span named after the operation, runs it, logs
//! the outcome through the [`StructuredLog`] helpers and hands a
//! [`SpanRecord`] to the logger. Results and errors pass through untouched.

use crate::{LogContext, SpanRecord, SpanStatus, StructuredLog};
use chrono::Utc;
use std::error::Error;
use std::future::Future;
use std::time::Instant;
use tracing::{Instrument, field};

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Time an outbound HTTP call.
///
/// Success is logged as a 200 response and failure as a 500 response
/// carrying the error message. The operation's error is returned unchanged.
pub async fn trace_api_call<L, T, E, F>(
    logger: &L,
    method: &str,
    url: &str,
    operation: F,
    context: LogContext,
) -> Result<T, E>
where
    L: StructuredLog + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let name = format!("[{}]: {} {}", logger.app_name(), method, url);
    let span = tracing::info_span!(
        "http.client",
        otel.name = %name,
        http.method = %method,
        url = %url,
        status = field::Empty,
        duration = field::Empty,
        error = field::Empty,
    );
    let started_at = Utc::now();
    let started = Instant::now();

    let result = operation.instrument(span.clone()).await;
    let duration_ms = elapsed_ms(started);
    span.record("duration", duration_ms);

    let status = match &result {
        Ok(_) => {
            span.record("status", "success");
            logger.api_response(method, url, 200, duration_ms, context.clone());
            SpanStatus::Success
        }
        Err(e) => {
            let message = e.to_string();
            span.record("status", "error");
            span.record("error", message.as_str());
            logger.api_response(
                method,
                url,
                500,
                duration_ms,
                context.clone().with("error", message.clone()),
            );
            SpanStatus::Error(message)
        }
    };

    logger.record_span(SpanRecord::new(
        "http.client",
        name,
        context,
        started_at,
        duration_ms,
        status,
    ));
    result
}

/// Time a file upload.
///
/// Success is logged with `upload_complete`, failure with `upload_error`;
/// both carry the duration.
pub async fn trace_upload<L, T, E, F>(
    logger: &L,
    file_id: &str,
    operation: F,
    context: LogContext,
) -> Result<T, E>
where
    L: StructuredLog + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    let name = format!("[{}]: Upload: {}", logger.app_name(), file_id);
    let span = tracing::info_span!(
        "file.upload",
        otel.name = %name,
        file_id = %file_id,
        status = field::Empty,
        duration = field::Empty,
        error = field::Empty,
    );
    let started_at = Utc::now();
    let started = Instant::now();

    let result = operation.instrument(span.clone()).await;
    let duration_ms = elapsed_ms(started);
    span.record("duration", duration_ms);
    let attributes = context.clone().with("fileId", file_id);

    let status = match &result {
        Ok(_) => {
            span.record("status", "success");
            logger.upload_complete(file_id, context.with("duration", duration_ms));
            SpanStatus::Success
        }
        Err(e) => {
            let message = e.to_string();
            span.record("status", "error");
            span.record("error", message.as_str());
            logger.upload_error(file_id, e, context.with("duration", duration_ms));
            SpanStatus::Error(message)
        }
    };

    logger.record_span(SpanRecord::new(
        "file.upload",
        name,
        attributes,
        started_at,
        duration_ms,
        status,
    ));
    result
}

/// Run a synchronous user action inside a span and log it.
pub fn trace_user_action<L, T, F>(logger: &L, action: &str, operation: F, context: LogContext) -> T
where
    L: StructuredLog + ?Sized,
    F: FnOnce() -> T,
{
    let name = format!("[{}]: User Action: {}", logger.app_name(), action);
    let span = tracing::info_span!("ui.action", otel.name = %name, action = %action);
    let started_at = Utc::now();
    let started = Instant::now();

    let result = span.in_scope(operation);
    logger.user_action(action, context.clone());

    logger.record_span(SpanRecord::new(
        "ui.action",
        name,
        context.with("action", action),
        started_at,
        elapsed_ms(started),
        SpanStatus::Success,
    ));
    result
}
