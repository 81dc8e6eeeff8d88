//! Shared server state.

use std::collections::BTreeSet;

use alertbot_axiom::AxiomClient;
use alertbot_routing::{Defaults, Destination, RoutingConfig, resolve_target};
use alertbot_telegram::Notifier;
use anyhow::Context;
use tracing::{info, warn};

use crate::settings::Settings;

/// Everything a request handler needs, built once at startup and shared
/// behind an `Arc`. The routing configuration is immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process settings.
    pub settings: Settings,
    /// Routing document; defaults apply even without one.
    pub config: RoutingConfig,
    /// Telegram sender.
    pub notifier: Notifier,
    /// Axiom client for enrichment and reconciliation.
    pub axiom: AxiomClient,
    /// True when a routing document was loaded; false falls back to the
    /// static chat/topic settings for every destination.
    routed: bool,
}

impl AppState {
    /// Builds the state from settings: loads and validates the routing
    /// document and constructs the HTTP clients.
    ///
    /// # Errors
    ///
    /// Fails when a routing document exists but is invalid, or an HTTP
    /// client cannot be built. Both are fatal at startup.
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let (config, routed) = if settings.routes_file.exists() {
            let config = RoutingConfig::load(&settings.routes_file).with_context(|| {
                format!("loading routes from {}", settings.routes_file.display())
            })?;
            info!(
                routes = config.routes.len(),
                path = %settings.routes_file.display(),
                "routing document loaded"
            );
            (config, true)
        } else {
            if settings.telegram_chat_id.is_empty() {
                warn!("no routing document and no fallback chat id, alerts will be dropped");
            } else {
                info!("no routing document, using static chat/topic fallback");
            }
            (RoutingConfig::default(), false)
        };

        let notifier =
            Notifier::new(&settings.telegram_bot_token).context("building telegram client")?;
        let axiom = AxiomClient::new(
            settings.axiom_mgmt_token.clone(),
            &settings.axiom_api_base,
            &settings.axiom_query_base,
        )
        .context("building axiom client")?;

        Ok(Self {
            settings,
            config,
            notifier,
            axiom,
            routed,
        })
    }

    /// Classification and formatting defaults in effect.
    #[must_use]
    pub fn defaults(&self) -> &Defaults {
        &self.config.defaults
    }

    /// Whether resolved alerts are delivered.
    #[must_use]
    pub fn include_resolved(&self) -> bool {
        self.config
            .defaults
            .include_resolved(self.settings.include_resolved)
    }

    /// Resolves the delivery destination for an alert.
    #[must_use]
    pub fn destination(
        &self,
        services: &BTreeSet<String>,
        hosts: &BTreeSet<String>,
        monitor: &str,
    ) -> Destination {
        if self.routed {
            resolve_target(&self.config, services, hosts, monitor)
        } else {
            self.settings.env_destination()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(extra: &[&str]) -> Settings {
        let mut args = vec![
            "alertbot",
            "--telegram-bot-token",
            "t",
            "--routes-file",
            "/nonexistent/routes.yml",
        ];
        args.extend_from_slice(extra);
        Settings::try_parse_from(args).expect("valid args")
    }

    #[test]
    fn missing_routes_file_falls_back_to_env_destination() {
        let state = AppState::from_settings(settings(&["--telegram-chat-id=-42"]))
            .expect("state builds");
        let dest = state.destination(&BTreeSet::new(), &BTreeSet::new(), "m");
        assert_eq!(dest, Destination::new("-42", None));
    }

    #[test]
    fn include_resolved_falls_back_to_settings() {
        let state = AppState::from_settings(settings(&["--include-resolved"]))
            .expect("state builds");
        assert!(state.include_resolved());
    }
}
