use chrono::{TimeZone, Utc};
use keepsake_core::{Environment, GallerySettings, KeepsakeConfig};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_bundled_defaults() {
    let config = KeepsakeConfig::from_toml_str("").unwrap();

    assert_eq!(*config.environment(), Environment::Development);
    assert_eq!(config.app_name(), "keepsake");
    assert_eq!(config.server().address(), "127.0.0.1:8080");
    assert!(config.collector().endpoint().is_none());
    assert_eq!(config.storage().key_prefix(), "henna-uploads/");

    let gallery = config.gallery();
    assert_eq!(
        *gallery.event_time(),
        Utc.with_ymd_and_hms(2025, 9, 18, 17, 0, 0).unwrap()
    );
    assert_eq!(gallery.reveal_after(), chrono::Duration::hours(25));
    assert_eq!(gallery.recheck_interval(), Duration::from_secs(60));
    assert_eq!(gallery.failsafe(), Duration::from_millis(5000));
    assert_eq!(*gallery.narrow_immediate_count(), 6);
    assert_eq!(*gallery.wide_immediate_count(), 12);
    assert_eq!(*gallery.wide_breakpoint_px(), 768);
    assert_eq!(*gallery.root_margin_px(), 50);
    assert_eq!(*gallery.visibility_threshold(), 0.1);
}

#[test]
fn test_bundled_defaults_match_code_defaults() {
    let config = KeepsakeConfig::from_toml_str("").unwrap();
    assert_eq!(config.gallery(), &GallerySettings::default());
}

#[test]
fn test_overrides_from_toml() {
    let config = KeepsakeConfig::from_toml_str(
        r#"
        environment = "production"

        [server]
        port = 9100

        [collector]
        endpoint = "https://collector.example.com/events"

        [gallery]
        event_time = "2026-06-01T18:00:00Z"
        failsafe_ms = 2000
        "#,
    )
    .unwrap();

    assert!(config.environment().is_production());
    assert_eq!(*config.server().port(), 9100);
    assert_eq!(config.server().host(), "127.0.0.1");
    assert_eq!(
        config.collector().endpoint().as_deref(),
        Some("https://collector.example.com/events")
    );
    assert_eq!(
        *config.gallery().event_time(),
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
    );
    assert_eq!(*config.gallery().failsafe_ms(), 2000);
    assert_eq!(*config.gallery().wide_immediate_count(), 12);
}

#[test]
fn test_traces_sample_rate_follows_environment() {
    let dev = KeepsakeConfig::from_toml_str("").unwrap();
    assert_eq!(dev.traces_sample_rate(), 1.0);

    let prod = KeepsakeConfig::from_toml_str("environment = \"production\"").unwrap();
    assert_eq!(prod.traces_sample_rate(), 0.1);

    let explicit = KeepsakeConfig::from_toml_str(
        "environment = \"production\"\n[collector]\ntraces_sample_rate = 3.0",
    )
    .unwrap();
    assert_eq!(explicit.traces_sample_rate(), 1.0);
}

#[test]
fn test_invalid_environment_is_rejected() {
    let result = KeepsakeConfig::from_toml_str("environment = \"staging\"");
    assert!(result.is_err());
}

#[test]
fn test_out_of_range_reveal_delay_is_rejected() {
    for hours in ["9223372036854775807", "2000000000000"] {
        let toml = format!("[gallery]\nreveal_after_hours = {}", hours);
        let error = KeepsakeConfig::from_toml_str(&toml).unwrap_err();
        assert!(error.to_string().contains("reveal_after_hours"), "{error}");
    }
}

#[test]
fn test_out_of_range_reveal_delay_never_unlocks() {
    let settings: GallerySettings =
        serde_json::from_value(serde_json::json!({ "reveal_after_hours": u64::MAX })).unwrap();
    assert!(settings.try_reveal_after().is_err());
    assert_eq!(settings.reveal_after(), chrono::TimeDelta::MAX);

    let defaults = GallerySettings::default();
    assert_eq!(defaults.try_reveal_after().unwrap(), chrono::TimeDelta::hours(25));
}

#[test]
fn test_load_with_explicit_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "app_name = \"henna-gallery\"\n[server]\nport = 7001").unwrap();

    let config = KeepsakeConfig::load_with(Some(file.path())).unwrap();
    assert_eq!(config.app_name(), "henna-gallery");
    assert_eq!(*config.server().port(), 7001);
}

#[test]
fn test_load_with_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(KeepsakeConfig::load_with(Some(&missing)).is_err());
}

#[test]
fn test_resolved_api_base() {
    let remote = KeepsakeConfig::from_toml_str(
        "[gallery]\napi_base = \"https://gallery.example.com/\"",
    )
    .unwrap();
    assert_eq!(
        remote.gallery().resolved_api_base(),
        "https://gallery.example.com/api"
    );

    let local =
        KeepsakeConfig::from_toml_str("[gallery]\napi_base = \"http://localhost:3000\"").unwrap();
    assert_eq!(local.gallery().resolved_api_base(), "/api");
}
