//! Core types for normalized alerts.
//!
//! This module provides the canonical representation of an inbound alert:
//! - [`AlertStatus`]: triggered / resolved / unknown, derived from the monitor name
//! - [`TimeWindow`]: the raw query window the monitor evaluated
//! - [`MatchRecord`]: one log row that matched the monitor query
//! - [`NormalizedAlert`]: the full canonical alert description

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The lifecycle status of an alert, parsed from the monitor name prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The monitor fired.
    Triggered,
    /// The monitor recovered.
    Resolved,
    /// The payload carried no recognizable status prefix.
    #[default]
    Unknown,
}

impl AlertStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Resolved => "resolved",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true if the alert announces a recovery.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The time window the monitor query covered, as the upstream sent it.
///
/// Timestamps are kept verbatim; parsing happens at the point of use so a
/// malformed timestamp never blocks alert processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start, usually RFC 3339.
    pub start: Option<String>,
    /// Window end, usually RFC 3339.
    pub end: Option<String>,
}

impl TimeWindow {
    /// Returns true if both ends of the window are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// One matched log row carried by the alert payload or returned by a
/// log-enrichment query. All fields are optional; an empty record is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Host that emitted the log line.
    pub host: Option<String>,
    /// Service that emitted the log line.
    pub service: Option<String>,
    /// Log message.
    pub message: Option<String>,
    /// HTTP status or application status code.
    pub status_code: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Request path.
    pub path: Option<String>,
}

/// Field aliases recognized for the message attribute.
const MESSAGE_KEYS: &[&str] = &["message", "msg", "log", "_raw"];
/// Field aliases recognized for the status attribute.
const STATUS_KEYS: &[&str] = &["status", "status_code", "code"];
/// Field aliases recognized for the user-agent attribute.
const USER_AGENT_KEYS: &[&str] = &["user_agent", "userAgent", "ua"];
/// Field aliases recognized for the path attribute.
const PATH_KEYS: &[&str] = &["path", "url", "request_path", "requestPath"];

impl MatchRecord {
    /// Extracts a record from an arbitrary JSON object.
    ///
    /// The row payload may be nested under a `data` key; each attribute is
    /// taken from the first present alias. Non-object input yields an empty
    /// record.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let data = match value.get("data") {
            Some(nested @ Value::Object(_)) => nested,
            _ => value,
        };
        let Value::Object(map) = data else {
            return Self::default();
        };

        Self {
            host: map.get("host").and_then(scalar_to_string),
            service: map.get("service").and_then(scalar_to_string),
            message: first_alias(map, MESSAGE_KEYS),
            status_code: first_alias_allow_zero(map, STATUS_KEYS),
            user_agent: first_alias(map, USER_AGENT_KEYS),
            path: first_alias(map, PATH_KEYS),
        }
    }

    /// Returns true if no attribute could be extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.service.is_none()
            && self.message.is_none()
            && self.status_code.is_none()
            && self.user_agent.is_none()
            && self.path.is_none()
    }
}

/// Renders a JSON scalar as a non-empty string.
fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// First non-empty value among the given aliases.
fn first_alias(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k).and_then(scalar_to_string))
}

/// First present value among the given aliases. Unlike [`first_alias`] a
/// numeric zero is kept, since `status: 0` is meaningful.
fn first_alias_allow_zero(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        map.get(*k).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    })
}

/// Canonical description of one inbound alert.
///
/// Produced by [`crate::payload::extract`]; identical payloads always yield
/// an identical `NormalizedAlert`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAlert {
    /// Monitor name with the status prefix stripped. Empty if unrecoverable.
    pub monitor_name: String,
    /// Status derived from the monitor name prefix.
    pub status: AlertStatus,
    /// Number of matched events, when the payload carried one.
    pub matched_count: Option<u64>,
    /// The query window of the monitor run.
    pub window: TimeWindow,
    /// Matched log rows. May be empty.
    pub match_records: Vec<MatchRecord>,
}

impl NormalizedAlert {
    /// Count to display: the explicit count, else the number of records.
    #[must_use]
    pub fn effective_count(&self) -> Option<u64> {
        self.matched_count
            .or_else(|| (!self.match_records.is_empty()).then(|| self.match_records.len() as u64))
    }
}
