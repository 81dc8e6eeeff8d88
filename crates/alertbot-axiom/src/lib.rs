//! Axiom integration for alertbot.
//!
//! Two independent concerns: best-effort log enrichment for alerts that
//! arrived without matched rows ([`AxiomClient::query_rows`]) and the
//! periodic monitor/notifier reconciliation pass ([`run_attach_loop`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attach;
pub mod client;
pub mod error;

pub use attach::{attach_notifiers_once, run_attach_loop};
pub use client::AxiomClient;
pub use error::{AxiomError, Result};
