//! Semantic validation of the routing document.
//!
//! Shape errors are caught by deserialization; this pass checks what the
//! schema cannot express: dangling group/topic/profile references, runbook
//! placeholder names, and list-typed operator values. All failures are
//! collected and reported together as `path: message` lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RoutingConfig;
use crate::error::ConfigError;
use crate::rule::RuleEntry;

/// Placeholders a runbook template may reference.
const ALLOWED_PLACEHOLDERS: &[&str] = &["host", "service", "container", "monitor"];

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// Validates the whole document, returning every failure at once.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] with one `path: message` line per
/// failure.
pub fn validate(config: &RoutingConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    check_references(config, &mut errors);
    check_placeholders(config, &mut errors);
    check_list_ops(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid { errors })
    }
}

fn check_references(config: &RoutingConfig, errors: &mut Vec<String>) {
    if let Some(name) = &config.default_group {
        if !config.groups.contains_key(name) {
            errors.push(format!("default_group: not found in groups: {name}"));
        }
    }
    if let Some(name) = &config.default_topic {
        if !config.topics.contains_key(name) {
            errors.push(format!("default_topic: not found in topics: {name}"));
        }
    }

    for (index, route) in config.routes.iter().enumerate() {
        if let Some(name) = &route.group {
            if !config.groups.contains_key(name) {
                errors.push(format!("routes[{index}].group: not found in groups: {name}"));
            }
        }
        if let Some(name) = &route.topic {
            if !config.topics.contains_key(name) {
                errors.push(format!("routes[{index}].topic: not found in topics: {name}"));
            }
        }
    }

    for (service_name, service) in &config.services {
        for profile in &service.profiles {
            if !config.profiles.contains_key(profile) {
                errors.push(format!(
                    "services.{service_name}.profiles: references missing profile: {profile}"
                ));
            }
        }
    }
}

fn check_placeholders(config: &RoutingConfig, errors: &mut Vec<String>) {
    let mut check = |path: String, steps: &[String]| {
        for (index, step) in steps.iter().enumerate() {
            check_step(&format!("{path}[{index}]"), step, errors);
        }
    };

    check("defaults.runbook".to_string(), &config.defaults.runbook);
    for (name, profile) in &config.profiles {
        if let Some(runbook) = &profile.runbook {
            check(format!("profiles.{name}.runbook"), runbook);
        }
    }
    for (name, service) in &config.services {
        if let Some(runbook) = &service.runbook {
            check(format!("services.{name}.runbook"), runbook);
        }
    }
}

fn check_step(path: &str, step: &str, errors: &mut Vec<String>) {
    for capture in PLACEHOLDER_RE.captures_iter(step) {
        let name = &capture[1];
        if !ALLOWED_PLACEHOLDERS.contains(&name) {
            errors.push(format!("{path}: unknown placeholder '{{{name}}}' in: {step}"));
        }
    }
    // Braces left over after removing well-formed tokens are a syntax error.
    let stripped = PLACEHOLDER_RE.replace_all(step, "");
    if stripped.contains('{') || stripped.contains('}') {
        errors.push(format!("{path}: invalid placeholder syntax in: {step}"));
    }
}

fn check_list_ops(config: &RoutingConfig, errors: &mut Vec<String>) {
    let mut check = |path: String, rules: &[RuleEntry]| {
        for (index, entry) in rules.iter().enumerate() {
            let rule = entry.matcher();
            if rule.op.requires_list() && !rule.value.is_list() {
                errors.push(format!(
                    "{path}[{index}].value: op '{}' requires a list value",
                    rule.op.as_str()
                ));
            }
        }
    };

    check("drop".to_string(), &config.drop);
    for (name, profile) in &config.profiles {
        check(format!("profiles.{name}.p1"), &profile.p1);
    }
}
