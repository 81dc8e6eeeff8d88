//! Route resolution: mapping alert attributes to a delivery destination.

use std::collections::BTreeSet;

use crate::config::{RouteMatch, RoutingConfig};

/// A resolved delivery destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    /// Chat identifier. Empty means nothing is configured and the message
    /// will be dropped by the notifier with a warning.
    pub chat_id: String,
    /// Optional topic (thread) identifier within the chat.
    pub topic_id: Option<i64>,
}

impl Destination {
    /// Creates a destination from parts.
    #[must_use]
    pub fn new(chat_id: impl Into<String>, topic_id: Option<i64>) -> Self {
        Self {
            chat_id: chat_id.into(),
            topic_id,
        }
    }
}

/// Tests one route's criteria against the alert attributes.
///
/// Every present key must pass a case-insensitive substring test; `service`
/// and `host` match if any value in the corresponding set contains the
/// pattern, `monitor` tests the single monitor name. An empty criteria block
/// matches everything.
#[must_use]
pub fn route_matches(
    criteria: &RouteMatch,
    services: &BTreeSet<String>,
    hosts: &BTreeSet<String>,
    monitor: &str,
) -> bool {
    if let Some(pattern) = &criteria.service {
        let pattern = pattern.to_lowercase();
        if !services.iter().any(|s| s.to_lowercase().contains(&pattern)) {
            return false;
        }
    }
    if let Some(pattern) = &criteria.host {
        let pattern = pattern.to_lowercase();
        if !hosts.iter().any(|h| h.to_lowercase().contains(&pattern)) {
            return false;
        }
    }
    if let Some(pattern) = &criteria.monitor {
        if !monitor.to_lowercase().contains(&pattern.to_lowercase()) {
            return false;
        }
    }
    true
}

/// Resolves the destination for an alert.
///
/// Routes are consulted in declared order and the first match wins; a later,
/// more specific route never fires once an earlier route matched. When no
/// route matches, the global default group and topic apply.
#[must_use]
pub fn resolve_target(
    config: &RoutingConfig,
    services: &BTreeSet<String>,
    hosts: &BTreeSet<String>,
    monitor: &str,
) -> Destination {
    for route in &config.routes {
        if route_matches(&route.criteria, services, hosts, monitor) {
            let group = route.group.as_deref().or(config.default_group.as_deref());
            let topic = route.topic.as_deref().or(config.default_topic.as_deref());
            return destination_of(config, group, topic);
        }
    }
    destination_of(
        config,
        config.default_group.as_deref(),
        config.default_topic.as_deref(),
    )
}

fn destination_of(config: &RoutingConfig, group: Option<&str>, topic: Option<&str>) -> Destination {
    let chat_id = group
        .and_then(|name| config.group_chat_id(name))
        .unwrap_or_default()
        .to_string();
    let topic_id = topic.and_then(|name| config.topic_id(name));
    Destination { chat_id, topic_id }
}
