//! Layered configuration.
//!
//! Configuration sources, later ones overriding earlier ones:
//! 1. Bundled defaults (`keepsake.toml` shipped with the workspace)
//! 2. `~/.config/keepsake/keepsake.toml`
//! 3. `./keepsake.toml`, or an explicit path
//! 4. `KEEPSAKE_*` environment variables, `__` separating sections
//!    (`KEEPSAKE_SERVER__PORT=9000`)

use crate::Environment;
use chrono::{DateTime, TimeDelta, Utc};
use config::{Config, File, FileFormat};
use keepsake_error::{ConfigError, KeepsakeError, KeepsakeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../keepsake.toml");

/// Listen address of the download proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ServerSettings {
    /// Interface to bind
    #[serde(default = "default_host")]
    host: String,
    /// TCP port
    #[serde(default = "default_port")]
    port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// `host:port` string suitable for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// External error/trace collector.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option)]
pub struct CollectorSettings {
    /// Event ingestion URL; no forwarding happens without one
    #[serde(default)]
    endpoint: Option<String>,
    /// Fraction of spans forwarded (environment default when unset)
    #[serde(default)]
    traces_sample_rate: Option<f64>,
}

/// Object storage the media URLs point into.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct StorageSettings {
    /// CDN domain fronting the bucket
    #[serde(default)]
    #[setters(strip_option)]
    cdn_domain: Option<String>,
    /// Bucket name for direct S3 URLs
    #[serde(default)]
    #[setters(strip_option)]
    bucket: Option<String>,
    /// Bucket region for direct S3 URLs
    #[serde(default)]
    #[setters(strip_option)]
    region: Option<String>,
    /// Key prefix stripped when building CDN URLs
    #[serde(default = "default_key_prefix")]
    key_prefix: String,
}

fn default_key_prefix() -> String {
    "henna-uploads/".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            cdn_domain: None,
            bucket: None,
            region: None,
            key_prefix: default_key_prefix(),
        }
    }
}

/// Gallery behaviour: time gate, lazy loading, video failsafe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GallerySettings {
    /// When the event started
    #[serde(default = "default_event_time")]
    event_time: DateTime<Utc>,
    /// Hours after the event before "download all" appears
    #[serde(default = "default_reveal_after_hours")]
    reveal_after_hours: u64,
    /// Seconds between time-gate checks
    #[serde(default = "default_recheck_interval_secs")]
    recheck_interval_secs: u64,
    /// Milliseconds before a silent video is forced out of its loading overlay
    #[serde(default = "default_failsafe_ms")]
    failsafe_ms: u64,
    /// Tiles loaded eagerly on narrow viewports
    #[serde(default = "default_narrow_immediate_count")]
    narrow_immediate_count: usize,
    /// Tiles loaded eagerly on wide viewports
    #[serde(default = "default_wide_immediate_count")]
    wide_immediate_count: usize,
    /// Viewport width at which a viewport counts as wide
    #[serde(default = "default_wide_breakpoint_px")]
    wide_breakpoint_px: u32,
    /// Margin added around the viewport when testing visibility
    #[serde(default = "default_root_margin_px")]
    root_margin_px: u32,
    /// Fraction of a tile that must be visible to trigger loading
    #[serde(default = "default_visibility_threshold")]
    visibility_threshold: f64,
    /// Public origin of the API; relative `/api` when unset or local
    #[serde(default)]
    api_base: Option<String>,
}

fn default_event_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-09-18T20:00:00+03:00")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn default_reveal_after_hours() -> u64 {
    25
}

fn default_recheck_interval_secs() -> u64 {
    60
}

fn default_failsafe_ms() -> u64 {
    5000
}

fn default_narrow_immediate_count() -> usize {
    6
}

fn default_wide_immediate_count() -> usize {
    12
}

fn default_wide_breakpoint_px() -> u32 {
    768
}

fn default_root_margin_px() -> u32 {
    50
}

fn default_visibility_threshold() -> f64 {
    0.1
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            event_time: default_event_time(),
            reveal_after_hours: default_reveal_after_hours(),
            recheck_interval_secs: default_recheck_interval_secs(),
            failsafe_ms: default_failsafe_ms(),
            narrow_immediate_count: default_narrow_immediate_count(),
            wide_immediate_count: default_wide_immediate_count(),
            wide_breakpoint_px: default_wide_breakpoint_px(),
            root_margin_px: default_root_margin_px(),
            visibility_threshold: default_visibility_threshold(),
            api_base: None,
        }
    }
}

impl GallerySettings {
    /// Delay after the event before the bulk download unlocks.
    ///
    /// Fails when `reveal_after_hours` does not fit a duration or pushes the
    /// unlock instant past the representable range.
    pub fn try_reveal_after(&self) -> Result<TimeDelta, ConfigError> {
        i64::try_from(self.reveal_after_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .filter(|delay| self.event_time.checked_add_signed(*delay).is_some())
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "gallery.reveal_after_hours out of range: {}",
                    self.reveal_after_hours
                ))
            })
    }

    /// Delay after the event before the bulk download unlocks; an out of
    /// range setting never unlocks.
    pub fn reveal_after(&self) -> TimeDelta {
        self.try_reveal_after().unwrap_or(TimeDelta::MAX)
    }

    /// Interval between time-gate checks.
    pub fn recheck_interval(&self) -> Duration {
        Duration::from_secs(self.recheck_interval_secs)
    }

    /// Video failsafe window.
    pub fn failsafe(&self) -> Duration {
        Duration::from_millis(self.failsafe_ms)
    }

    /// Base path for API calls.
    ///
    /// A configured base pointing at localhost is ignored to avoid the
    /// development server calling itself in a loop.
    ///
    /// ```
    /// use keepsake_core::GallerySettings;
    ///
    /// assert_eq!(GallerySettings::default().resolved_api_base(), "/api");
    /// ```
    pub fn resolved_api_base(&self) -> String {
        match self.api_base.as_deref().map(|b| b.trim_end_matches('/')) {
            Some(base) if !base.is_empty() && !base.contains("localhost") => {
                format!("{}/api", base)
            }
            _ => "/api".to_string(),
        }
    }
}

/// Top-level Keepsake configuration.
///
/// # Example
///
/// ```no_run
/// use keepsake_core::KeepsakeConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = KeepsakeConfig::load()?;
/// println!("Listening on {}", config.server().address());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct KeepsakeConfig {
    /// Deployment environment
    #[serde(default)]
    environment: Environment,
    /// Application tag attached to log lines and collector events
    #[serde(default = "default_app_name")]
    app_name: String,
    /// Download proxy listen address
    #[serde(default)]
    server: ServerSettings,
    /// External collector
    #[serde(default)]
    collector: CollectorSettings,
    /// Object storage
    #[serde(default)]
    storage: StorageSettings,
    /// Gallery behaviour
    #[serde(default)]
    gallery: GallerySettings,
}

fn default_app_name() -> String {
    "keepsake".to_string()
}

impl Default for KeepsakeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            app_name: default_app_name(),
            server: ServerSettings::default(),
            collector: CollectorSettings::default(),
            storage: StorageSettings::default(),
            gallery: GallerySettings::default(),
        }
    }
}

impl KeepsakeConfig {
    /// Load configuration with the default precedence, reading `./keepsake.toml`
    /// when present.
    #[instrument]
    pub fn load() -> KeepsakeResult<Self> {
        Self::load_with(None)
    }

    /// Load configuration, using `path` instead of `./keepsake.toml` when given.
    ///
    /// An explicit path must exist; the implicit files are optional.
    #[instrument]
    pub fn load_with(path: Option<&Path>) -> KeepsakeResult<Self> {
        debug!("Loading configuration: env > file > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/keepsake/keepsake.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("keepsake").required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("KEEPSAKE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::finish(builder)
    }

    /// Parse configuration from TOML text layered over the bundled defaults.
    ///
    /// ```
    /// use keepsake_core::{Environment, KeepsakeConfig};
    ///
    /// let config = KeepsakeConfig::from_toml_str("environment = \"production\"").unwrap();
    /// assert_eq!(*config.environment(), Environment::Production);
    /// assert_eq!(*config.server().port(), 8080);
    /// ```
    pub fn from_toml_str(toml: &str) -> KeepsakeResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> KeepsakeResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                KeepsakeError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                KeepsakeError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.gallery.try_reveal_after()?;
        Ok(config)
    }

    /// Fraction of spans forwarded to the collector.
    pub fn traces_sample_rate(&self) -> f64 {
        self.collector
            .traces_sample_rate()
            .unwrap_or_else(|| self.environment.default_traces_sample_rate())
            .clamp(0.0, 1.0)
    }

    /// Override the environment, e.g. from a command-line flag.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the listen address.
    pub fn with_server(mut self, server: ServerSettings) -> Self {
        self.server = server;
        self
    }
}

impl ServerSettings {
    /// Create listen settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}
