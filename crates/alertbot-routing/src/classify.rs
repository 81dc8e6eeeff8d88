//! Alert classification: suppression, severity, and runbook resolution.

use std::collections::BTreeSet;

use alertbot_ingest::AlertContext;

use crate::config::RoutingConfig;
use crate::rule::rule_matches;

/// Placeholder text used when a runbook step references a value the alert
/// did not carry.
const FALLBACK_HOST: &str = "нужный хост";
const FALLBACK_SERVICE: &str = "нужный сервис";
const FALLBACK_MONITOR: &str = "нужный монитор";

/// Classification decisions over one immutable configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a RoutingConfig,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over the given configuration.
    #[must_use]
    pub const fn new(config: &'a RoutingConfig) -> Self {
        Self { config }
    }

    /// Returns true if any configured drop rule matches the context.
    ///
    /// Rules are OR-ed; evaluation short-circuits on the first match and the
    /// result does not depend on rule order.
    #[must_use]
    pub fn should_drop(&self, ctx: &AlertContext) -> bool {
        self.config
            .drop
            .iter()
            .any(|entry| rule_matches(entry.matcher(), ctx))
    }

    /// Collects the profile names declared by the alert's services.
    ///
    /// Services are visited in sorted order; duplicates are removed by first
    /// occurrence while preserving the cross-service order.
    #[must_use]
    pub fn resolve_profiles(&self, services: &BTreeSet<String>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut profiles = Vec::new();
        for service in services {
            let Some(service_cfg) = self.config.services.get(service) else {
                continue;
            };
            for name in &service_cfg.profiles {
                if !name.is_empty() && seen.insert(name.as_str()) {
                    profiles.push(name.clone());
                }
            }
        }
        profiles
    }

    /// Returns true if any rule in any named profile's `p1` list matches.
    #[must_use]
    pub fn is_p1(&self, profiles: &[String], ctx: &AlertContext) -> bool {
        profiles
            .iter()
            .filter_map(|name| self.config.profiles.get(name))
            .flat_map(|profile| &profile.p1)
            .any(|entry| rule_matches(entry.matcher(), ctx))
    }

    /// Resolves the runbook through the three-tier cascade: the first service
    /// (sorted) with a declared runbook, else the first profile with one,
    /// else the global default. Each tier is consulted only when the prior
    /// tier yielded nothing.
    #[must_use]
    pub fn resolve_runbook(&self, services: &BTreeSet<String>, profiles: &[String]) -> Vec<String> {
        for service in services {
            if let Some(runbook) = self
                .config
                .services
                .get(service)
                .and_then(|s| s.runbook.as_ref())
            {
                return runbook.clone();
            }
        }

        for name in profiles {
            if let Some(runbook) = self
                .config
                .profiles
                .get(name)
                .and_then(|p| p.runbook.as_ref())
            {
                return runbook.clone();
            }
        }

        self.config.defaults.runbook.clone()
    }

    /// Severity tag for the outbound message, chosen solely by `is_p1`.
    #[must_use]
    pub fn severity_tag(&self, p1: bool) -> &'a str {
        if p1 {
            &self.config.tags.user_impact
        } else {
            &self.config.tags.service_errors
        }
    }
}

/// Renders runbook steps, substituting `{host}`, `{service}`, and
/// `{monitor}`.
///
/// An empty substituted value becomes a fixed placeholder phrase instead of
/// an empty string. A step referencing an unknown placeholder (or with
/// broken brace syntax) is emitted unrendered rather than failing the whole
/// runbook.
#[must_use]
pub fn render_runbook(steps: &[String], host: &str, service: &str, monitor: &str) -> Vec<String> {
    let host = if host.is_empty() { FALLBACK_HOST } else { host };
    let service = if service.is_empty() {
        FALLBACK_SERVICE
    } else {
        service
    };
    let monitor = if monitor.is_empty() {
        FALLBACK_MONITOR
    } else {
        monitor
    };

    steps
        .iter()
        .map(|step| render_step(step, host, service, monitor).unwrap_or_else(|| step.clone()))
        .collect()
}

/// Renders one step; `None` means the step must be emitted as written.
fn render_step(step: &str, host: &str, service: &str, monitor: &str) -> Option<String> {
    let mut rendered = String::with_capacity(step.len());
    let mut rest = step;
    while let Some(open) = rest.find('{') {
        let close = rest[open..].find('}')?;
        rendered.push_str(&rest[..open]);
        let name = &rest[open + 1..open + close];
        match name {
            "host" => rendered.push_str(host),
            "service" => rendered.push_str(service),
            "monitor" => rendered.push_str(monitor),
            _ => return None,
        }
        rest = &rest[open + close + 1..];
    }
    rendered.push_str(rest);
    Some(rendered)
}
