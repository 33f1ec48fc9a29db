//! Deployment environment flag.

use serde::{Deserialize, Serialize};

/// Which deployment the process is running in.
///
/// Development routes log output to the local console; production forwards it
/// to the external collector instead. Test does neither.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    #[display("development")]
    Development,
    /// Deployed site
    #[display("production")]
    Production,
    /// Automated tests
    #[display("test")]
    Test,
}

impl Environment {
    /// True for [`Environment::Development`].
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// True for [`Environment::Production`].
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Fraction of traces forwarded to the collector by default.
    pub fn default_traces_sample_rate(&self) -> f64 {
        if self.is_production() { 0.1 } else { 1.0 }
    }
}
