//! The per-alert decision: suppression, severity, runbook.
//!
//! A pure function over one alert context and one configuration snapshot.
//! Handlers only wire its output into formatting and delivery.

use alertbot_ingest::AlertContext;
use alertbot_routing::{Classifier, RoutingConfig, render_runbook};

/// What to do with one alert that was not suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Severity hashtag for the message header.
    pub tag: String,
    /// Rendered runbook steps.
    pub runbook: Vec<String>,
}

/// Classifies one alert. `None` means a drop rule matched and the alert
/// must be suppressed.
#[must_use]
pub fn classify(config: &RoutingConfig, ctx: &AlertContext) -> Option<Outcome> {
    let classifier = Classifier::new(config);
    if classifier.should_drop(ctx) {
        return None;
    }

    let profiles = classifier.resolve_profiles(&ctx.services);
    let p1 = classifier.is_p1(&profiles, ctx);
    let runbook = render_runbook(
        &classifier.resolve_runbook(&ctx.services, &profiles),
        &ctx.host,
        &ctx.service,
        &ctx.title,
    );

    Some(Outcome {
        tag: classifier.severity_tag(p1).to_string(),
        runbook,
    })
}
