//! The structured logger.

use crate::{
    Breadcrumb, Collector, CollectorEvent, ExceptionReport, HttpCollector, LogContext, LogLevel,
    NoopCollector, SpanRecord, UserContext,
};
use chrono::{DateTime, SecondsFormat, Utc};
use keepsake_core::{Environment, KeepsakeConfig};
use keepsake_error::{CollectorError, CollectorErrorKind, KeepsakeResult};
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

const MAX_BREADCRUMBS: usize = 100;

/// Leveled logging with structured context.
///
/// Implementors supply [`StructuredLog::emit`]; everything else is provided.
/// The helpers fix the message text and add their own fields on top of the
/// caller's context, including a `type` field naming the helper.
pub trait StructuredLog: Send + Sync {
    /// Record one message. Must never panic or fail the caller.
    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
        context: LogContext,
    );

    /// Record a finished span. Ignored unless overridden.
    fn record_span(&self, _span: SpanRecord) {}

    /// Application tag used in span names.
    fn app_name(&self) -> &str {
        "keepsake"
    }

    /// Record a message at `level`.
    fn log(&self, level: LogLevel, message: &str, context: LogContext) {
        self.emit(level, message, None, context);
    }

    /// Record a debug message.
    fn debug(&self, message: &str, context: LogContext) {
        self.emit(LogLevel::Debug, message, None, context);
    }

    /// Record an informational message.
    fn info(&self, message: &str, context: LogContext) {
        self.emit(LogLevel::Info, message, None, context);
    }

    /// Record a warning.
    fn warn(&self, message: &str, context: LogContext) {
        self.emit(LogLevel::Warn, message, None, context);
    }

    /// Record an error, optionally with the error being reported.
    fn error(&self, message: &str, error: Option<&(dyn Error + 'static)>, context: LogContext) {
        self.emit(LogLevel::Error, message, error, context);
    }

    /// An outbound request is starting.
    fn api_request(&self, method: &str, url: &str, context: LogContext) {
        self.info(
            &format!("API Request: {} {}", method, url),
            context
                .with("method", method)
                .with("url", url)
                .with("type", "api_request"),
        );
    }

    /// A request finished; statuses of 400 and above are logged as errors.
    fn api_response(
        &self,
        method: &str,
        url: &str,
        status_code: u16,
        duration_ms: u64,
        context: LogContext,
    ) {
        let message = format!(
            "API Response: {} {} - {} ({}ms)",
            method, url, status_code, duration_ms
        );
        let context = context
            .with("method", method)
            .with("url", url)
            .with("statusCode", status_code)
            .with("duration", duration_ms)
            .with("type", "api_response");
        if status_code >= 400 {
            self.error(&message, None, context);
        } else {
            self.info(&message, context);
        }
    }

    /// The user did something worth recording.
    fn user_action(&self, action: &str, context: LogContext) {
        self.info(
            &format!("User Action: {}", action),
            context.with("action", action).with("type", "user_action"),
        );
    }

    /// Upload progress, in percent.
    fn upload_progress(&self, file_id: &str, progress: f64, context: LogContext) {
        self.debug(
            &format!("Upload Progress: {} - {}%", file_id, progress),
            context
                .with("fileId", file_id)
                .with("progress", progress)
                .with("type", "upload_progress"),
        );
    }

    /// An upload finished.
    fn upload_complete(&self, file_id: &str, context: LogContext) {
        self.info(
            &format!("Upload Complete: {}", file_id),
            context
                .with("fileId", file_id)
                .with("type", "upload_complete"),
        );
    }

    /// An upload failed.
    fn upload_error(&self, file_id: &str, error: &(dyn Error + 'static), context: LogContext) {
        self.error(
            &format!("Upload Error: {}", file_id),
            Some(error),
            context.with("fileId", file_id).with("type", "upload_error"),
        );
    }

    /// Server-side media processing changed state.
    fn media_processing(&self, file_id: &str, status: &str, context: LogContext) {
        self.info(
            &format!("Media Processing: {} - {}", file_id, status),
            context
                .with("fileId", file_id)
                .with("status", status)
                .with("type", "media_processing"),
        );
    }

    /// Something security-relevant happened.
    fn security_event(&self, event: &str, context: LogContext) {
        self.warn(
            &format!("Security Event: {}", event),
            context.with("event", event).with("type", "security_event"),
        );
    }
}

#[derive(Debug, Default)]
struct Scope {
    breadcrumbs: VecDeque<Breadcrumb>,
    user: Option<UserContext>,
}

impl Scope {
    fn push(&mut self, breadcrumb: Breadcrumb) {
        if self.breadcrumbs.len() == MAX_BREADCRUMBS {
            self.breadcrumbs.pop_front();
        }
        self.breadcrumbs.push_back(breadcrumb);
    }
}

/// Environment-aware [`StructuredLog`] implementation.
///
/// - **Development**: each call is formatted with [`Logger::format_message`]
///   and written through `tracing` at the matching level.
/// - **Production**: each call except debug becomes a [`CollectorEvent`] with
///   scope tags, the breadcrumb trail and the current user.
/// - **Test**: nothing is written anywhere.
///
/// # Example
///
/// ```
/// use keepsake_core::Environment;
/// use keepsake_logger::{LogContext, Logger, MemoryCollector, StructuredLog};
/// use std::sync::Arc;
///
/// let collector = Arc::new(MemoryCollector::new());
/// let logger = Logger::new(Environment::Production, collector.clone())
///     .with_tag("component", "server");
///
/// logger.debug("not forwarded", LogContext::new());
/// logger.warn("Slow response", LogContext::new().with("ms", 900));
///
/// let events = collector.events();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].tags()["component"], "server");
/// assert_eq!(events[0].tags()["server"], "true");
/// ```
pub struct Logger {
    environment: Environment,
    app_name: String,
    collector: Arc<dyn Collector>,
    tags: BTreeMap<String, String>,
    traces_sample_rate: f64,
    scope: Mutex<Scope>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("environment", &self.environment)
            .field("app_name", &self.app_name)
            .field("tags", &self.tags)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create a logger for `environment` forwarding to `collector`.
    pub fn new(environment: Environment, collector: Arc<dyn Collector>) -> Self {
        let app_name = "keepsake".to_string();
        let mut tags = BTreeMap::new();
        tags.insert("app".to_string(), app_name.clone());
        Self {
            environment,
            app_name,
            collector,
            tags,
            traces_sample_rate: environment.default_traces_sample_rate(),
            scope: Mutex::new(Scope::default()),
        }
    }

    /// Build a logger from loaded configuration.
    ///
    /// Events are posted to the configured collector endpoint; without one
    /// they are discarded.
    pub fn from_config(config: &KeepsakeConfig) -> KeepsakeResult<Self> {
        let collector: Arc<dyn Collector> = match config.collector().endpoint() {
            Some(endpoint) if !endpoint.is_empty() => Arc::new(HttpCollector::new(endpoint)?),
            _ => Arc::new(NoopCollector),
        };
        Ok(Self::new(*config.environment(), collector)
            .with_app_name(config.app_name())
            .with_traces_sample_rate(config.traces_sample_rate()))
    }

    /// Set the application tag.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self.tags.insert("app".to_string(), self.app_name.clone());
        self
    }

    /// Add a tag to every forwarded event.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Fraction of spans forwarded, clamped to `0.0..=1.0`.
    pub fn with_traces_sample_rate(mut self, rate: f64) -> Self {
        self.traces_sample_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Deployment environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Attach (or clear) the user identity sent with later events.
    pub fn set_user(&self, user: Option<UserContext>) {
        self.scope.lock().user = user;
    }

    /// Current breadcrumb trail, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.scope.lock().breadcrumbs.iter().cloned().collect()
    }

    /// Console line for a log call.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use keepsake_logger::{LogContext, LogLevel, Logger};
    ///
    /// let at = Utc.with_ymd_and_hms(2025, 9, 18, 17, 0, 0).unwrap();
    /// let line = Logger::format_message(
    ///     at,
    ///     "keepsake",
    ///     LogLevel::Info,
    ///     "Hello",
    ///     &LogContext::new().with("a", 1),
    /// );
    /// assert_eq!(line, "[2025-09-18T17:00:00.000Z] [keepsake]: INFO: Hello | {\"a\":1}");
    /// ```
    pub fn format_message(
        timestamp: DateTime<Utc>,
        app_name: &str,
        level: LogLevel,
        message: &str,
        context: &LogContext,
    ) -> String {
        let context_str = if context.is_empty() {
            String::new()
        } else {
            format!(
                " | {}",
                serde_json::to_string(context).unwrap_or_default()
            )
        };
        format!(
            "[{}] [{}]: {}: {}{}",
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            app_name,
            level.label(),
            message,
            context_str
        )
    }

    fn write_console(&self, level: LogLevel, message: &str, context: &LogContext) {
        let line = Self::format_message(Utc::now(), &self.app_name, level, message, context);
        match level {
            LogLevel::Debug => tracing::debug!(target: "keepsake", "{}", line),
            LogLevel::Info => tracing::info!(target: "keepsake", "{}", line),
            LogLevel::Warn => tracing::warn!(target: "keepsake", "{}", line),
            LogLevel::Error => tracing::error!(target: "keepsake", "{}", line),
        }
    }

    fn forward(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
        context: LogContext,
    ) {
        if level == LogLevel::Debug {
            return;
        }

        let (breadcrumbs, user) = {
            let mut scope = self.scope.lock();
            scope.push(Breadcrumb::new(message, level));
            (
                scope.breadcrumbs.iter().cloned().collect(),
                scope.user.clone(),
            )
        };

        let mut tags = self.tags.clone();
        tags.extend(context.to_tags());
        tags.insert("server".to_string(), "true".to_string());

        let event = CollectorEvent::new(
            level,
            message.to_string(),
            tags,
            breadcrumbs,
            error.map(ExceptionReport::from_error),
            context,
            self.environment,
            user,
        );
        self.deliver(|collector| collector.capture(event));
    }

    fn deliver<F>(&self, send: F)
    where
        F: FnOnce(&dyn Collector) -> Result<(), CollectorError>,
    {
        let collector = self.collector.as_ref();
        let outcome = catch_unwind(AssertUnwindSafe(|| send(collector)))
            .unwrap_or_else(|_| Err(CollectorError::new(CollectorErrorKind::Panicked)));
        if let Err(e) = outcome {
            tracing::debug!(error = %e, "Collector delivery failed");
        }
    }
}

impl StructuredLog for Logger {
    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
        context: LogContext,
    ) {
        if self.environment.is_development() {
            self.write_console(level, message, &context);
        }
        if self.environment.is_production() {
            self.forward(level, message, error, context);
        }
    }

    fn record_span(&self, span: SpanRecord) {
        if !self.environment.is_production() {
            return;
        }
        if self.traces_sample_rate < 1.0 && rand::random::<f64>() >= self.traces_sample_rate {
            return;
        }
        self.deliver(|collector| collector.record_span(span));
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }
}

thread_local! {
    static REPORTING_PANIC: Cell<bool> = const { Cell::new(false) };
}

/// Route panics through `logger` before the previous hook runs.
///
/// Reporting happens on a short-lived thread. A panic raised while reporting
/// unwinds there and is swallowed by the logger instead of aborting the
/// process; panics on that thread are not reported again.
pub fn install_panic_hook(logger: Arc<dyn StructuredLog>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if REPORTING_PANIC.with(Cell::get) {
            previous(info);
            return;
        }
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        let context = LogContext::new()
            .with("panic", payload)
            .with("location", location);

        std::thread::scope(|scope| {
            let report = std::thread::Builder::new()
                .name("keepsake-panic-report".to_string())
                .spawn_scoped(scope, || {
                    REPORTING_PANIC.with(|flag| flag.set(true));
                    logger.error("Unhandled panic", None, context);
                });
            match report {
                Ok(handle) => {
                    if handle.join().is_err() {
                        eprintln!("Panic report failed");
                    }
                }
                Err(e) => eprintln!("Failed to spawn panic reporter: {}", e),
            }
        });
        previous(info);
    }));
}
