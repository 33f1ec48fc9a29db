//! Tests for environment routing, helpers and collector isolation.

use chrono::{TimeZone, Utc};
use keepsake_core::{Environment, KeepsakeConfig};
use keepsake_error::CollectorError;
use keepsake_logger::{
    Collector, CollectorEvent, LogContext, LogLevel, Logger, MemoryCollector, SpanRecord,
    StructuredLog, UserContext,
};
use std::sync::Arc;
use strum::IntoEnumIterator;

fn production() -> (Logger, Arc<MemoryCollector>) {
    let collector = Arc::new(MemoryCollector::new());
    let logger = Logger::new(Environment::Production, collector.clone());
    (logger, collector)
}

#[derive(Debug)]
struct Outer(std::io::Error);

impl std::fmt::Display for Outer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload rejected")
    }
}

impl std::error::Error for Outer {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

struct PanickingCollector;

impl Collector for PanickingCollector {
    fn capture(&self, _event: CollectorEvent) -> Result<(), CollectorError> {
        panic!("collector exploded");
    }

    fn record_span(&self, _span: SpanRecord) -> Result<(), CollectorError> {
        panic!("collector exploded");
    }
}

struct RejectingCollector;

impl Collector for RejectingCollector {
    fn capture(&self, _event: CollectorEvent) -> Result<(), CollectorError> {
        Err(CollectorError::new(
            keepsake_error::CollectorErrorKind::Delivery("503".to_string()),
        ))
    }

    fn record_span(&self, _span: SpanRecord) -> Result<(), CollectorError> {
        Err(CollectorError::new(
            keepsake_error::CollectorErrorKind::Delivery("503".to_string()),
        ))
    }
}

#[test]
fn test_level_names_agree() {
    let levels: Vec<LogLevel> = LogLevel::iter().collect();
    assert_eq!(
        levels,
        [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error]
    );
    for level in levels {
        let name = level.to_string();
        assert_eq!(level.label(), name.to_uppercase());
        assert_eq!(serde_json::to_value(level).unwrap(), serde_json::json!(name));
    }
}

#[test]
fn test_production_forwards_all_levels_but_debug() {
    let (logger, collector) = production();

    logger.debug("noise", LogContext::new());
    logger.info("hello", LogContext::new());
    logger.warn("careful", LogContext::new());
    logger.error("broken", None, LogContext::new());

    let levels: Vec<LogLevel> = collector.events().iter().map(|e| *e.level()).collect();
    assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
}

#[test]
fn test_development_and_test_do_not_forward() {
    for environment in [Environment::Development, Environment::Test] {
        let collector = Arc::new(MemoryCollector::new());
        let logger = Logger::new(environment, collector.clone());
        logger.info("hello", LogContext::new().with("k", "v"));
        logger.error("broken", None, LogContext::new());
        assert!(collector.events().is_empty(), "{environment} forwarded");
    }
}

#[test]
fn test_events_carry_scope_and_context_tags() {
    let collector = Arc::new(MemoryCollector::new());
    let logger = Logger::new(Environment::Production, collector.clone())
        .with_app_name("henna-gallery")
        .with_tag("component", "server");

    logger.info(
        "Downloaded",
        LogContext::new().with("mediaId", "m-7").with("itemIndex", 3),
    );

    let event = &collector.events()[0];
    let tags = event.tags();
    assert_eq!(tags["app"], "henna-gallery");
    assert_eq!(tags["component"], "server");
    assert_eq!(tags["server"], "true");
    assert_eq!(tags["mediaId"], "m-7");
    assert_eq!(tags["itemIndex"], "3");
    assert_eq!(*event.environment(), Environment::Production);
    assert_eq!(
        event.context().get("mediaId").and_then(|v| v.as_str()),
        Some("m-7")
    );
}

#[test]
fn test_api_response_level_follows_status() {
    let (logger, collector) = production();

    logger.api_response("GET", "/api/media", 200, 12, LogContext::new());
    logger.api_response("GET", "/api/media", 404, 8, LogContext::new());

    let events = collector.events();
    assert_eq!(*events[0].level(), LogLevel::Info);
    assert_eq!(events[0].message(), "API Response: GET /api/media - 200 (12ms)");
    assert_eq!(*events[1].level(), LogLevel::Error);
    assert_eq!(
        events[1].context().get("statusCode").and_then(|v| v.as_u64()),
        Some(404)
    );
    assert_eq!(
        events[1].context().get("type").and_then(|v| v.as_str()),
        Some("api_response")
    );
}

#[test]
fn test_helper_fields_override_caller_context() {
    let (logger, collector) = production();

    logger.user_action(
        "Download media",
        LogContext::new()
            .with("action", "spoofed")
            .with("mediaId", "m-1"),
    );

    let event = &collector.events()[0];
    assert_eq!(event.message(), "User Action: Download media");
    let context = event.context();
    assert_eq!(
        context.get("action").and_then(|v| v.as_str()),
        Some("Download media")
    );
    assert_eq!(context.get("mediaId").and_then(|v| v.as_str()), Some("m-1"));
    assert_eq!(
        context.get("type").and_then(|v| v.as_str()),
        Some("user_action")
    );
}

#[test]
fn test_helper_messages() {
    let (logger, collector) = production();

    logger.api_request("POST", "/api/upload", LogContext::new());
    logger.upload_progress("f1", 50.0, LogContext::new());
    logger.upload_complete("f1", LogContext::new());
    logger.media_processing("f1", "transcoding", LogContext::new());
    logger.security_event("Rate limit hit", LogContext::new());

    let messages: Vec<String> = collector
        .events()
        .iter()
        .map(|e| e.message().clone())
        .collect();
    // Upload progress is debug level and never forwarded.
    assert_eq!(
        messages,
        vec![
            "API Request: POST /api/upload",
            "Upload Complete: f1",
            "Media Processing: f1 - transcoding",
            "Security Event: Rate limit hit",
        ]
    );
    assert_eq!(*collector.events()[3].level(), LogLevel::Warn);
}

#[test]
fn test_error_reports_exception_chain() {
    let (logger, collector) = production();
    let error = Outer(std::io::Error::other("disk full"));

    logger.upload_error("f9", &error, LogContext::new());

    let event = &collector.events()[0];
    assert_eq!(event.message(), "Upload Error: f9");
    let exception = event.exception().as_ref().expect("exception attached");
    assert_eq!(exception.message(), "upload rejected");
    assert_eq!(exception.causes(), &vec!["disk full".to_string()]);
}

#[test]
fn test_breadcrumbs_are_bounded() {
    let (logger, collector) = production();

    for i in 0..150 {
        logger.info(&format!("step {i}"), LogContext::new());
    }

    let trail = logger.breadcrumbs();
    assert_eq!(trail.len(), 100);
    assert_eq!(trail[0].message(), "step 50");
    assert_eq!(trail[99].message(), "step 149");

    let last = collector.events().pop().expect("event captured");
    assert_eq!(
        last.breadcrumbs().last().map(|b| b.message().as_str()),
        Some("step 149")
    );
}

#[test]
fn test_user_context_is_attached() {
    let (logger, collector) = production();

    logger.set_user(Some(UserContext::new(None, Some("session-1".to_string()))));
    logger.info("with user", LogContext::new());
    logger.set_user(None);
    logger.info("without user", LogContext::new());

    let events = collector.events();
    assert_eq!(
        events[0]
            .user()
            .as_ref()
            .and_then(|u| u.session_id().as_deref()),
        Some("session-1")
    );
    assert!(events[1].user().is_none());
}

#[test]
fn test_panicking_collector_does_not_reach_caller() {
    let logger = Logger::new(Environment::Production, Arc::new(PanickingCollector));

    logger.info("still fine", LogContext::new());
    logger.error("still fine", None, LogContext::new());
    logger.record_span(SpanRecord::new(
        "ui.action",
        "noop",
        LogContext::new(),
        Utc::now(),
        1,
        keepsake_logger::SpanStatus::Success,
    ));
}

#[test]
fn test_rejecting_collector_does_not_reach_caller() {
    let logger = Logger::new(Environment::Production, Arc::new(RejectingCollector));
    logger.warn("ignored failure", LogContext::new());
}

#[test]
fn test_format_message_without_context() {
    let at = Utc.with_ymd_and_hms(2025, 9, 19, 8, 30, 0).unwrap();
    let line = Logger::format_message(at, "keepsake", LogLevel::Warn, "Heads up", &LogContext::new());
    assert_eq!(line, "[2025-09-19T08:30:00.000Z] [keepsake]: WARN: Heads up");
}

#[test]
fn test_from_config_uses_configured_names() {
    let config = KeepsakeConfig::from_toml_str(
        r#"
        environment = "production"
        app_name = "henna-gallery"
        "#,
    )
    .unwrap();

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.environment(), Environment::Production);
    assert_eq!(logger.app_name(), "henna-gallery");
}

#[test]
fn test_context_tags_skip_nulls() {
    let context = LogContext::new()
        .with("a", "text")
        .with("b", serde_json::Value::Null)
        .with("c", true);
    let tags = context.to_tags();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags["a"], "text");
    assert_eq!(tags["c"], "true");
}
