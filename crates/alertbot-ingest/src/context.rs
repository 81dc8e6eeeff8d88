//! Alert context reduction.
//!
//! [`ContextBuilder`] folds matched records (and optional enrichment rows)
//! into the flat [`AlertContext`] that rule evaluation, routing, and message
//! formatting consume. Hosts and services become deduplicated sets; message,
//! status, user-agent, and path values keep their encounter order and
//! duplicates, which the frequency-based top-error selection depends on.

use std::collections::{BTreeSet, HashMap};

use crate::types::MatchRecord;

/// Default number of distinct sample messages to surface.
pub const DEFAULT_SAMPLE_COUNT: usize = 2;

/// Accumulator for match-record attributes.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    hosts: BTreeSet<String>,
    services: BTreeSet<String>,
    messages: Vec<String>,
    statuses: Vec<String>,
    user_agents: Vec<String>,
    paths: Vec<String>,
}

impl ContextBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the accumulator.
    pub fn push(&mut self, record: &MatchRecord) {
        if let Some(host) = &record.host {
            self.hosts.insert(host.clone());
        }
        if let Some(service) = &record.service {
            self.services.insert(service.clone());
        }
        if let Some(message) = &record.message {
            self.messages.push(message.clone());
        }
        if let Some(status) = &record.status_code {
            self.statuses.push(status.clone());
        }
        if let Some(user_agent) = &record.user_agent {
            self.user_agents.push(user_agent.clone());
        }
        if let Some(path) = &record.path {
            self.paths.push(path.clone());
        }
    }

    /// Folds a batch of records.
    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a MatchRecord>) {
        for record in records {
            self.push(record);
        }
    }

    /// Returns true if no message attribute has been collected yet.
    ///
    /// Used to decide whether a log-enrichment query is worth running.
    #[must_use]
    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    /// First service in sorted order, for enrichment query hints.
    #[must_use]
    pub fn service_hint(&self) -> Option<&str> {
        self.services.iter().next().map(String::as_str)
    }

    /// First host in sorted order, for enrichment query hints.
    #[must_use]
    pub fn host_hint(&self) -> Option<&str> {
        self.hosts.iter().next().map(String::as_str)
    }

    /// When no record carried a service, guesses one from the monitor name
    /// by taking the prefix before an em-dash or `" - "` separator.
    pub fn ensure_service_hint(&mut self, monitor_name: &str) {
        if self.services.is_empty() {
            if let Some(guess) = guess_service(monitor_name) {
                self.services.insert(guess);
            }
        }
    }

    /// Finalizes the accumulator into an [`AlertContext`].
    ///
    /// Service names are normalized here (status prefix and em-dash suffix
    /// stripped). `top_error_enabled` mirrors the configuration default: when
    /// off, the `message` rule field stays empty and no top error is shown.
    #[must_use]
    pub fn build(self, monitor_name: &str, top_error_enabled: bool) -> AlertContext {
        let services: BTreeSet<String> = self
            .services
            .iter()
            .map(|s| normalize_service(s))
            .filter(|s| !s.is_empty())
            .collect();

        let top_error = if top_error_enabled {
            most_common(&self.messages).map(ToOwned::to_owned)
        } else {
            None
        };
        let top_status = most_common(&self.statuses).unwrap_or_default().to_string();
        let top_user_agent = most_common(&self.user_agents).unwrap_or_default().to_string();
        let top_path = most_common(&self.paths).unwrap_or_default().to_string();

        let host = self.hosts.iter().next().cloned().unwrap_or_default();
        let service = services.iter().next().cloned().unwrap_or_default();

        AlertContext {
            title: monitor_name.to_string(),
            top_error,
            status: top_status,
            user_agent: top_user_agent,
            path: top_path,
            host,
            service,
            hosts: self.hosts,
            services,
            messages: self.messages,
        }
    }
}

/// Flat, per-alert view consumed by rules, routing, and formatting.
#[derive(Debug, Clone, Default)]
pub struct AlertContext {
    /// Monitor name (rule field `title`).
    pub title: String,
    /// Most frequent message, if enabled and any message exists.
    pub top_error: Option<String>,
    /// Most frequent status code (rule field `status`).
    pub status: String,
    /// Most frequent user agent (rule field `user_agent`).
    pub user_agent: String,
    /// Most frequent request path (rule field `path`).
    pub path: String,
    /// First host in sorted order (rule field `host`).
    pub host: String,
    /// First normalized service in sorted order (rule field `service`).
    pub service: String,
    /// All hosts, deduplicated and sorted.
    pub hosts: BTreeSet<String>,
    /// All normalized services, deduplicated and sorted.
    pub services: BTreeSet<String>,
    /// All messages in encounter order, duplicates retained.
    pub messages: Vec<String>,
}

impl AlertContext {
    /// Resolves a rule field to its bound value. Absent or empty fields
    /// resolve to `None`, which makes every rule operator evaluate false.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "title" => self.title.as_str(),
            "message" => self.top_error.as_deref().unwrap_or(""),
            "status" => self.status.as_str(),
            "user_agent" => self.user_agent.as_str(),
            "path" => self.path.as_str(),
            "host" => self.host.as_str(),
            "service" => self.service.as_str(),
            _ => return None,
        };
        if value.is_empty() { None } else { Some(value) }
    }

    /// First `count` distinct messages in encounter order.
    #[must_use]
    pub fn sample_messages(&self, count: usize) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut samples = Vec::new();
        for message in &self.messages {
            if samples.len() >= count {
                break;
            }
            if seen.insert(message.as_str()) {
                samples.push(message.as_str());
            }
        }
        samples
    }

    /// `host:service` display label, with a `(multiple)` marker when more
    /// than one of either was seen. Empty when neither is known.
    #[must_use]
    pub fn location_label(&self) -> String {
        let display = match (self.host.is_empty(), self.service.is_empty()) {
            (false, false) => format!("{}:{}", self.host, self.service),
            (true, false) => self.service.clone(),
            (false, true) => self.host.clone(),
            (true, true) => return String::new(),
        };
        if self.hosts.len() > 1 || self.services.len() > 1 {
            format!("{display} (multiple)")
        } else {
            display
        }
    }
}

/// Most frequent value; ties break to the first-encountered value.
///
/// The tie-break is deliberate: counts live in a map, but the winner is
/// chosen by rescanning the original list in order, so map iteration order
/// can never leak into the result.
#[must_use]
pub fn most_common(values: &[String]) -> Option<&str> {
    if values.is_empty() {
        return None;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    let max = counts.values().copied().max()?;
    values
        .iter()
        .map(String::as_str)
        .find(|v| counts.get(v) == Some(&max))
}

/// Guesses a service name from a monitor name prefix.
fn guess_service(monitor_name: &str) -> Option<String> {
    for separator in ["—", " - "] {
        if let Some((prefix, _)) = monitor_name.split_once(separator) {
            let guess = prefix.trim();
            if !guess.is_empty() {
                return Some(guess.to_string());
            }
        }
    }
    None
}

/// Normalizes a derived service name: strips a recognized status prefix and
/// anything after an em-dash.
fn normalize_service(service: &str) -> String {
    let cleaned = match service.split_once(": ") {
        Some((prefix, rest))
            if matches!(prefix.to_lowercase().as_str(), "triggered" | "resolved") =>
        {
            rest
        }
        _ => service,
    };
    let cleaned = cleaned.trim();
    match cleaned.split_once('—') {
        Some((prefix, _)) => prefix.trim().to_string(),
        None => cleaned.to_string(),
    }
}
