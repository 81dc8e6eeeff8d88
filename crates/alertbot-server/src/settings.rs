//! Process settings, read from flags or environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use alertbot_routing::Destination;
use clap::Parser;

/// Alertbot server settings. Every flag has an environment variable
/// counterpart, which is how production deployments configure the process.
#[derive(Debug, Clone, Parser)]
#[command(name = "alertbot", about = "Alert normalization, classification, and routing")]
pub struct Settings {
    /// Telegram bot token used for delivery.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: String,

    /// Fallback chat id when no routing document is present.
    #[arg(long, env = "TELEGRAM_CHAT_ID", default_value = "")]
    pub telegram_chat_id: String,

    /// Fallback topic id when no routing document is present.
    #[arg(long, env = "TELEGRAM_TOPIC_ID")]
    pub telegram_topic_id: Option<i64>,

    /// Shared secret matched against the `X-Webhook-Secret` header.
    /// Empty disables the check.
    #[arg(long, env = "WEBHOOK_SECRET", default_value = "")]
    pub webhook_secret: String,

    /// Axiom management token; empty disables enrichment and reconciliation.
    #[arg(long, env = "AXIOM_MGMT_TOKEN", default_value = "")]
    pub axiom_mgmt_token: String,

    /// Axiom management API base URL.
    #[arg(long, env = "AXIOM_API_BASE", default_value = "https://api.axiom.co")]
    pub axiom_api_base: String,

    /// Axiom query API base URL.
    #[arg(long, env = "AXIOM_QUERY_BASE", default_value = "https://cloud.axiom.co")]
    pub axiom_query_base: String,

    /// Dataset queried for log enrichment; empty disables enrichment.
    #[arg(long, env = "AXIOM_DATASET", default_value = "")]
    pub axiom_dataset: String,

    /// Seconds between notifier reconciliation passes.
    #[arg(long, env = "AXIOM_ATTACH_INTERVAL_SECONDS", default_value_t = 300)]
    pub axiom_attach_interval_seconds: u64,

    /// Deliver resolved alerts too, unless the routing document says
    /// otherwise.
    #[arg(long, env = "ALERTBOT_INCLUDE_RESOLVED", default_value_t = false)]
    pub include_resolved: bool,

    /// Address the HTTP server binds to.
    #[arg(long, env = "ALERTBOT_BIND", default_value = "0.0.0.0:8000")]
    pub bind_addr: SocketAddr,

    /// Path to the routing document. A missing file falls back to the
    /// static chat/topic settings; an invalid file is fatal.
    #[arg(long, env = "ALERTBOT_ROUTES_FILE", default_value = "routes.yml")]
    pub routes_file: PathBuf,
}

impl Settings {
    /// The static destination used when no routing document is loaded.
    #[must_use]
    pub fn env_destination(&self) -> Destination {
        Destination::new(self.telegram_chat_id.clone(), self.telegram_topic_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let mut full = vec!["alertbot", "--telegram-bot-token", "t"];
        full.extend_from_slice(args);
        Settings::try_parse_from(full).expect("valid args")
    }

    #[test]
    fn defaults() {
        let settings = parse(&[]);
        assert_eq!(settings.axiom_api_base, "https://api.axiom.co");
        assert_eq!(settings.axiom_attach_interval_seconds, 300);
        assert!(!settings.include_resolved);
        assert_eq!(settings.bind_addr.port(), 8000);
        assert_eq!(settings.env_destination(), Destination::default());
    }

    #[test]
    fn env_destination_from_flags() {
        let settings = parse(&["--telegram-chat-id=-100", "--telegram-topic-id=7"]);
        assert_eq!(settings.env_destination(), Destination::new("-100", Some(7)));
    }
}
