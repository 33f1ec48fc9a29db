//! Destinations for production events and spans.

use crate::{CollectorEvent, SpanRecord};
use keepsake_error::{CollectorError, CollectorErrorKind, HttpError};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Receives structured events and finished spans.
///
/// Implementations must not block: [`crate::Logger`] calls them inline from
/// every production log call. Errors are reported back only so the logger can
/// note them in debug output; they never reach the caller of the log method.
pub trait Collector: Send + Sync {
    /// Accept one event.
    fn capture(&self, event: CollectorEvent) -> Result<(), CollectorError>;

    /// Accept one finished span.
    fn record_span(&self, span: SpanRecord) -> Result<(), CollectorError>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollector;

impl Collector for NoopCollector {
    fn capture(&self, _event: CollectorEvent) -> Result<(), CollectorError> {
        Ok(())
    }

    fn record_span(&self, _span: SpanRecord) -> Result<(), CollectorError> {
        Ok(())
    }
}

/// Keeps events and spans in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryCollector {
    events: Mutex<Vec<CollectorEvent>>,
    spans: Mutex<Vec<SpanRecord>>,
}

impl MemoryCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events captured so far, oldest first.
    pub fn events(&self) -> Vec<CollectorEvent> {
        self.events.lock().clone()
    }

    /// Spans recorded so far, oldest first.
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().clone()
    }

    /// Forget everything captured.
    pub fn clear(&self) {
        self.events.lock().clear();
        self.spans.lock().clear();
    }
}

impl Collector for MemoryCollector {
    fn capture(&self, event: CollectorEvent) -> Result<(), CollectorError> {
        self.events.lock().push(event);
        Ok(())
    }

    fn record_span(&self, span: SpanRecord) -> Result<(), CollectorError> {
        self.spans.lock().push(span);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
enum Envelope<'a> {
    Event(&'a CollectorEvent),
    Span(&'a SpanRecord),
}

/// Posts events and spans as JSON to an ingestion endpoint.
///
/// Delivery runs on the current Tokio runtime in a detached task, so calls
/// return immediately. Outside a runtime, calls fail with
/// [`CollectorErrorKind::NoRuntime`].
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCollector {
    /// Create a collector posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build collector client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Ingestion URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send(&self, envelope: Envelope<'_>) -> Result<(), CollectorError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| CollectorError::new(CollectorErrorKind::NoRuntime))?;
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| CollectorError::new(CollectorErrorKind::Encode(e.to_string())))?;

        let request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "Collector rejected payload");
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Collector unreachable"),
            }
        });
        Ok(())
    }
}

impl Collector for HttpCollector {
    fn capture(&self, event: CollectorEvent) -> Result<(), CollectorError> {
        self.send(Envelope::Event(&event))
    }

    fn record_span(&self, span: SpanRecord) -> Result<(), CollectorError> {
        self.send(Envelope::Span(&span))
    }
}
