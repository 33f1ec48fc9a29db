//! Structured context attached to log calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key/value context for a log call.
///
/// Keys are kept sorted so console lines and collector payloads are stable.
///
/// # Examples
///
/// ```
/// use keepsake_logger::LogContext;
///
/// let base = LogContext::new().with("mediaId", "m-1").with("itemIndex", 3);
/// let merged = base.merged(LogContext::new().with("itemIndex", 4));
///
/// assert_eq!(merged.get("mediaId").and_then(|v| v.as_str()), Some("m-1"));
/// assert_eq!(merged.get("itemIndex").and_then(|v| v.as_u64()), Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext(BTreeMap<String, Value>);

impl LogContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a field in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Field value, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Combine with `other`; fields in `other` win.
    pub fn merged(mut self, other: LogContext) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Fields flattened to collector tags.
    ///
    /// Strings are used as-is, nulls are skipped, everything else is rendered
    /// as JSON.
    pub fn to_tags(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for LogContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
