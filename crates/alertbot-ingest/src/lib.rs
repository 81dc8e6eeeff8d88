//! Alert payload normalization and context extraction for alertbot.
//!
//! `alertbot-ingest` turns arbitrarily shaped monitoring webhook payloads
//! into a canonical, deterministic form:
//!
//! - [`payload::extract`] searches an ordered table of key-path aliases
//!   across the payload, its nested event object, and a string-encoded event
//!   body, producing a [`NormalizedAlert`].
//! - [`ContextBuilder`] reduces the alert's match records (plus optional
//!   enrichment rows) into a flat [`AlertContext`] of deduplicated attribute
//!   sets and order-preserving value lists.
//!
//! Extraction is total: malformed or incomplete payloads degrade to empty
//! fields instead of failing, so a misbehaving upstream can never crash
//! alert delivery.
//!
//! # Example
//!
//! ```rust
//! use alertbot_ingest::{payload, AlertStatus, ContextBuilder};
//! use serde_json::json;
//!
//! let alert = payload::extract(&json!({
//!     "name": "Triggered: api — 5xx spike",
//!     "matches": [{"data": {"host": "web-1", "message": "upstream timeout"}}],
//! }));
//! assert_eq!(alert.status, AlertStatus::Triggered);
//! assert_eq!(alert.monitor_name, "api — 5xx spike");
//!
//! let mut builder = ContextBuilder::new();
//! builder.extend(&alert.match_records);
//! builder.ensure_service_hint(&alert.monitor_name);
//! let ctx = builder.build(&alert.monitor_name, true);
//! assert_eq!(ctx.field("host"), Some("web-1"));
//! assert_eq!(ctx.field("service"), Some("api"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod payload;
pub mod types;

pub use context::{AlertContext, ContextBuilder, DEFAULT_SAMPLE_COUNT, most_common};
pub use types::{AlertStatus, MatchRecord, NormalizedAlert, TimeWindow};
