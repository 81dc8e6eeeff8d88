//! Telegram delivery for alertbot.
//!
//! Two concerns live here: rendering an alert into a sanitized HTML message
//! ([`AlertMessage`], [`format_local_alert`]) and delivering it through the
//! Bot API ([`Notifier`]). Messages are hard-capped at
//! [`MAX_MESSAGE_CHARS`] characters, log-derived lines are stripped of ANSI
//! escapes and credentials before they can reach a chat.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod format;

pub use client::Notifier;
pub use error::{NotifyError, Result};
pub use format::{
    AlertMessage, MAX_MESSAGE_CHARS, RUNBOOK_LINE_LIMIT, SAMPLE_LINE_LIMIT, escape_html,
    format_local_alert, format_timestamp, sanitize_line, truncate_chars,
};
