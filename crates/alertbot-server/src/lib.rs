//! Alertbot HTTP server.
//!
//! Wires the pipeline together: webhook ingestion, payload normalization,
//! optional log enrichment, rule-based classification, destination routing,
//! and delivery. All per-request decisions are pure functions over one
//! immutable configuration snapshot.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use settings::Settings;
pub use state::AppState;
