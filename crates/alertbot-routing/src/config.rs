//! The immutable routing configuration document.
//!
//! Loaded once at process start, validated as a whole, and never mutated.
//! Every request sees the same snapshot, so no locking is needed anywhere in
//! the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, Result};
use crate::rule::RuleEntry;
use crate::validate;

/// A chat identifier as the chat API expects it.
///
/// Accepts both quoted and bare numeric YAML scalars, since operators write
/// `-1001234567890` either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatId(pub String);

impl ChatId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Int(id) => Self(id.to_string()),
        })
    }
}

/// Match criteria of one route. Every present key must pass; an empty block
/// matches every alert (useful as an explicit catch-all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteMatch {
    /// Case-insensitive substring tested against every service.
    pub service: Option<String>,
    /// Case-insensitive substring tested against every host.
    pub host: Option<String>,
    /// Case-insensitive substring tested against the monitor name.
    pub monitor: Option<String>,
}

/// One ordered routing entry mapping alert attributes to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    /// Match criteria.
    #[serde(rename = "match", default)]
    pub criteria: RouteMatch,
    /// Group name; falls back to `default_group` when omitted.
    #[serde(default)]
    pub group: Option<String>,
    /// Topic name; falls back to `default_topic` when omitted.
    #[serde(default)]
    pub topic: Option<String>,
}

/// A named, reusable bundle of P1 rules and an optional runbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Rules that classify a matching alert as user-impacting.
    #[serde(default)]
    pub p1: Vec<RuleEntry>,
    /// Remediation steps, consulted after service runbooks.
    #[serde(default)]
    pub runbook: Option<Vec<String>>,
}

/// Per-service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Profiles applied to alerts from this service.
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Remediation steps, consulted first in the runbook cascade.
    #[serde(default)]
    pub runbook: Option<Vec<String>>,
}

/// Severity tag strings attached to the outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tags {
    /// Tag for P1 (user-impacting) alerts.
    pub user_impact: String,
    /// Tag for everything else.
    pub service_errors: String,
}

impl Default for Tags {
    fn default() -> Self {
        Self {
            user_impact: "#user-impact".to_string(),
            service_errors: "#service-errors".to_string(),
        }
    }
}

/// Tunable defaults for classification and formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    /// Whether to compute and show the most frequent message.
    pub top_error: bool,
    /// Number of distinct sample messages to show.
    pub sample_count: usize,
    /// Whether resolved alerts are delivered at all. Unset defers to the
    /// process-level setting.
    pub include_resolved: Option<bool>,
    /// Global fallback runbook, the last tier of the cascade.
    pub runbook: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            top_error: true,
            sample_count: 2,
            include_resolved: None,
            runbook: Vec::new(),
        }
    }
}

impl Defaults {
    /// Whether resolved alerts are delivered, deferring to `fallback` when
    /// the document does not say.
    #[must_use]
    pub fn include_resolved(&self, fallback: bool) -> bool {
        self.include_resolved.unwrap_or(fallback)
    }
}

/// The full routing document.
///
/// Recognized sections mirror the documented schema; an unknown section is a
/// load-time error so a typo cannot silently disable a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Group name → chat identifier.
    pub groups: BTreeMap<String, ChatId>,
    /// Topic name → topic (thread) identifier.
    pub topics: BTreeMap<String, i64>,
    /// Ordered routes; first match wins.
    pub routes: Vec<Route>,
    /// Group used when no route matches.
    pub default_group: Option<String>,
    /// Topic used when no route matches.
    pub default_topic: Option<String>,
    /// Suppression rules; any match drops the alert.
    pub drop: Vec<RuleEntry>,
    /// Named P1/runbook profiles.
    pub profiles: BTreeMap<String, Profile>,
    /// Per-service profile lists and runbooks.
    pub services: BTreeMap<String, ServiceConfig>,
    /// Severity tag strings.
    pub tags: Tags,
    /// Classification and formatting defaults.
    pub defaults: Defaults,
}

impl RoutingConfig {
    /// Parses and validates a routing document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document does not match the
    /// schema, or [`ConfigError::Invalid`] listing every semantic failure.
    /// An invalid document is never partially applied.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        validate::validate(&config)?;
        Ok(config)
    }

    /// Loads and validates a routing document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// as [`Self::from_yaml`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Resolves a group name to its chat identifier.
    #[must_use]
    pub fn group_chat_id(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(ChatId::as_str)
    }

    /// Resolves a topic name to its thread identifier.
    #[must_use]
    pub fn topic_id(&self, name: &str) -> Option<i64> {
        self.topics.get(name).copied()
    }
}
