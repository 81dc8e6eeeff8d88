//! Routing configuration, rule evaluation, and alert classification.
//!
//! `alertbot-routing` owns the declarative side of alertbot: the YAML
//! routing document, the small rule language evaluated against an
//! [`alertbot_ingest::AlertContext`], severity classification, runbook
//! resolution, and destination routing.
//!
//! The configuration is loaded and validated once at process start
//! ([`RoutingConfig::load`]) and shared immutably for the process lifetime;
//! every per-alert decision is a pure function over that snapshot.
//!
//! # Example
//!
//! ```rust
//! use alertbot_ingest::ContextBuilder;
//! use alertbot_routing::{Classifier, RoutingConfig, resolve_target};
//!
//! let config = RoutingConfig::from_yaml(r#"
//! groups: {ops: "-100"}
//! topics: {incidents: 1}
//! routes:
//!   - match: {service: api}
//!     group: ops
//!     topic: incidents
//! default_group: ops
//! default_topic: incidents
//! "#).expect("valid config");
//!
//! let mut builder = ContextBuilder::new();
//! builder.ensure_service_hint("api — 5xx spike");
//! let ctx = builder.build("api — 5xx spike", true);
//!
//! let classifier = Classifier::new(&config);
//! assert!(!classifier.should_drop(&ctx));
//!
//! let dest = resolve_target(&config, &ctx.services, &ctx.hosts, &ctx.title);
//! assert_eq!(dest.chat_id, "-100");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod error;
pub mod route;
pub mod rule;
pub mod validate;

pub use classify::{Classifier, render_runbook};
pub use config::{ChatId, Defaults, Profile, Route, RouteMatch, RoutingConfig, ServiceConfig, Tags};
pub use error::{ConfigError, Result};
pub use route::{Destination, resolve_target, route_matches};
pub use rule::{RuleEntry, RuleMatch, RuleOp, RuleValue, Scalar, rule_matches};
