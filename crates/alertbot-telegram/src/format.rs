//! Outbound message rendering and sanitization.
//!
//! Everything that ends up in a chat message passes through [`sanitize_line`]:
//! ANSI escape sequences are stripped, bot tokens and bearer credentials are
//! redacted, long lines are truncated, and HTML metacharacters are escaped so
//! log content cannot break out of `<code>` blocks.

use std::borrow::Cow;

use alertbot_ingest::{AlertStatus, TimeWindow};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Hard ceiling on outbound message length, in characters. A longer message
/// is cut to exactly this length, ellipsis included.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Per-line limit for top-error and sample lines.
pub const SAMPLE_LINE_LIMIT: usize = 200;

/// Per-line limit for runbook steps.
pub const RUNBOOK_LINE_LIMIT: usize = 300;

static ANSI_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi pattern is valid")
});

static BOT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"bot\d{6,}:[A-Za-z0-9_-]{20,}").expect("bot token pattern is valid")
});

static BEARER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._\-]+").expect("bearer pattern is valid")
});

/// Truncates to at most `limit` characters. When the input is over the limit
/// the result is exactly `limit` characters and ends with an ellipsis.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    Cow::Owned(cut)
}

/// Escapes `&`, `<`, and `>` for an HTML-parse-mode message body.
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn redact(text: &str) -> String {
    let text = BOT_TOKEN_RE.replace_all(text, "bot<redacted>");
    BEARER_RE.replace_all(&text, "${1}<redacted>").into_owned()
}

/// Cleans one log-derived line for inclusion in a message: strips ANSI
/// escapes, redacts credentials, truncates to `limit` characters, escapes
/// HTML.
#[must_use]
pub fn sanitize_line(text: &str, limit: usize) -> String {
    let stripped = ANSI_RE.replace_all(text, "");
    let redacted = redact(stripped.trim());
    escape_html(&truncate_chars(&redacted, limit))
}

/// Renders an ISO-8601 timestamp as `YYYY-MM-DD HH:MM UTC`; unparseable
/// inputs come back verbatim.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    let candidate = raw.trim();
    let normalized = if let Some(prefix) = candidate.strip_suffix(" UTC") {
        Cow::Owned(format!("{prefix}Z"))
    } else {
        Cow::Borrowed(candidate)
    };
    match DateTime::parse_from_rfc3339(&normalized) {
        Ok(ts) => ts.to_utc().format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => candidate.to_string(),
    }
}

/// All the pieces of one monitoring alert message.
#[derive(Debug, Clone)]
pub struct AlertMessage<'a> {
    /// Severity hashtag, rendered before the header.
    pub tag: &'a str,
    /// Alert status, selects the header emoji.
    pub status: AlertStatus,
    /// Monitor display name.
    pub title: &'a str,
    /// `host:service` label; empty hides the line.
    pub location: &'a str,
    /// Matched event count; `None` renders as `?`.
    pub count: Option<u64>,
    /// Alert time window; rendered only when both ends are present.
    pub window: &'a TimeWindow,
    /// Most frequent error message, if any.
    pub top_error: Option<&'a str>,
    /// Distinct sample messages.
    pub samples: &'a [&'a str],
    /// Rendered runbook steps.
    pub runbook: &'a [String],
}

impl AlertMessage<'_> {
    /// Renders the message body, HTML parse mode, already length-capped.
    #[must_use]
    pub fn render(&self) -> String {
        let emoji = if self.status.is_resolved() {
            "✅"
        } else {
            "🚨"
        };
        let title = if self.title.is_empty() {
            "Unknown monitor"
        } else {
            self.title
        };

        let mut lines = vec![format!(
            "{} {emoji} <b>{}</b>",
            self.tag,
            escape_html(title)
        )];

        if !self.location.is_empty() {
            lines.push(format!("📍 {}", escape_html(self.location)));
        }

        let count = self
            .count
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        lines.push(format!("📊 Событий: <b>{count}</b>"));

        if let (Some(start), Some(end)) = (&self.window.start, &self.window.end) {
            lines.push(format!(
                "🕐 {} → {}",
                format_timestamp(start),
                format_timestamp(end)
            ));
        }

        if let Some(top) = self.top_error {
            lines.push(format!(
                "🧾 Топ-ошибка: <code>{}</code>",
                sanitize_line(top, SAMPLE_LINE_LIMIT)
            ));
        }
        if !self.samples.is_empty() {
            lines.push("🧾 Примеры:".to_string());
            for sample in self.samples {
                lines.push(format!(
                    "<code>{}</code>",
                    sanitize_line(sample, SAMPLE_LINE_LIMIT)
                ));
            }
        }

        if !self.runbook.is_empty() {
            lines.push(String::new());
            lines.push("Что делать:".to_string());
            let steps: Vec<String> = self
                .runbook
                .iter()
                .map(|step| sanitize_line(step, RUNBOOK_LINE_LIMIT))
                .collect();
            lines.push(format!("<blockquote>{}</blockquote>", steps.join("\n")));
        }

        truncate_chars(&lines.join("\n"), MAX_MESSAGE_CHARS).into_owned()
    }
}

/// Renders a local health-watcher alert. The body line is omitted when the
/// body is empty.
#[must_use]
pub fn format_local_alert(title: &str, body: &str) -> String {
    let mut text = format!("🔧 <b>{}</b>", escape_html(title.trim()));
    if !body.is_empty() {
        text.push_str(&format!(
            "\n<code>{}</code>",
            sanitize_line(body, RUNBOOK_LINE_LIMIT)
        ));
    }
    truncate_chars(&text, MAX_MESSAGE_CHARS).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    mod truncation_tests {
        use super::*;

        #[test]
        fn short_text_untouched() {
            assert_eq!(truncate_chars("hello", 10), "hello");
            assert_eq!(truncate_chars("exactly", 7), "exactly");
        }

        #[test]
        fn long_text_cut_to_exact_limit() {
            let long = "x".repeat(4500);
            let cut = truncate_chars(&long, MAX_MESSAGE_CHARS);
            assert_eq!(cut.chars().count(), 4000);
            assert!(cut.ends_with('…'));
        }

        #[test]
        fn multibyte_counted_in_chars() {
            let long = "ю".repeat(50);
            let cut = truncate_chars(&long, 10);
            assert_eq!(cut.chars().count(), 10);
            assert!(cut.ends_with('…'));
        }
    }

    mod sanitize_tests {
        use super::*;

        #[test]
        fn ansi_sequences_stripped() {
            assert_eq!(
                sanitize_line("\u{1b}[31merror\u{1b}[0m here", 200),
                "error here"
            );
        }

        #[test]
        fn bot_token_redacted() {
            let line = "GET https://api.telegram.org/bot123456789:AAFwx-yz_0123456789abcdefghij/sendMessage";
            let clean = sanitize_line(line, 200);
            assert!(clean.contains("bot&lt;redacted&gt;"));
            assert!(!clean.contains("AAFwx"));
        }

        #[test]
        fn bearer_redacted() {
            let clean = sanitize_line("authorization: Bearer abc.def-ghi failed", 200);
            assert_eq!(clean, "authorization: Bearer &lt;redacted&gt; failed");
        }

        #[test]
        fn html_escaped_after_truncation() {
            assert_eq!(sanitize_line("<script>&", 200), "&lt;script&gt;&amp;");
        }

        #[test]
        fn line_limit_applies() {
            let clean = sanitize_line(&"a".repeat(250), 200);
            // 199 chars plus the ellipsis; escaping adds nothing for ASCII.
            assert_eq!(clean.chars().count(), 200);
            assert!(clean.ends_with('…'));
        }
    }

    mod timestamp_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("2024-05-01T10:30:00Z", "2024-05-01 10:30 UTC"; "zulu")]
        #[test_case("2024-05-01T10:30:00+00:00", "2024-05-01 10:30 UTC"; "offset")]
        #[test_case("2024-05-01T12:30:00+02:00", "2024-05-01 10:30 UTC"; "converted to utc")]
        #[test_case("2024-05-01T10:30:00 UTC", "2024-05-01 10:30 UTC"; "utc suffix")]
        #[test_case("not a date", "not a date"; "unparseable verbatim")]
        fn formats(input: &str, expected: &str) {
            assert_eq!(format_timestamp(input), expected);
        }
    }

    mod render_tests {
        use super::*;

        fn window(start: Option<&str>, end: Option<&str>) -> TimeWindow {
            TimeWindow {
                start: start.map(ToOwned::to_owned),
                end: end.map(ToOwned::to_owned),
            }
        }

        fn base(win: &TimeWindow) -> AlertMessage<'_> {
            AlertMessage {
                tag: "#service-errors",
                status: AlertStatus::Triggered,
                title: "m",
                location: "",
                count: None,
                window: win,
                top_error: None,
                samples: &[],
                runbook: &[],
            }
        }

        #[test]
        fn full_message_layout() {
            let win = window(Some("2024-05-01T10:00:00Z"), Some("2024-05-01T10:05:00Z"));
            let runbook = vec!["restart api on web-1".to_string()];
            let msg = AlertMessage {
                tag: "#user-impact",
                status: AlertStatus::Triggered,
                title: "api — 5xx spike",
                location: "web-1:api",
                count: Some(17),
                window: &win,
                top_error: Some("upstream timed out"),
                samples: &[],
                runbook: &runbook,
            };

            let text = msg.render();
            assert!(text.starts_with("#user-impact 🚨 <b>api — 5xx spike</b>"));
            assert!(text.contains("📍 web-1:api"));
            assert!(text.contains("📊 Событий: <b>17</b>"));
            assert!(text.contains("🕐 2024-05-01 10:00 UTC → 2024-05-01 10:05 UTC"));
            assert!(text.contains("🧾 Топ-ошибка: <code>upstream timed out</code>"));
            assert!(text.contains("Что делать:\n<blockquote>restart api on web-1</blockquote>"));
        }

        #[test]
        fn resolved_uses_checkmark() {
            let win = window(None, None);
            let msg = AlertMessage {
                status: AlertStatus::Resolved,
                title: "api",
                ..base(&win)
            };
            assert!(msg.render().contains("✅ <b>api</b>"));
        }

        #[test]
        fn unknown_count_renders_question_mark() {
            let win = window(None, None);
            assert!(base(&win).render().contains("📊 Событий: <b>?</b>"));
        }

        #[test]
        fn samples_listed_after_top_error() {
            let win = window(None, None);
            let samples = ["first boom", "second boom"];
            let msg = AlertMessage {
                top_error: Some("first boom"),
                samples: &samples,
                ..base(&win)
            };
            let text = msg.render();
            assert!(text.contains("🧾 Топ-ошибка: <code>first boom</code>"));
            assert!(text.contains("🧾 Примеры:\n<code>first boom</code>\n<code>second boom</code>"));
        }

        #[test]
        fn partial_window_omits_time_line() {
            let win = window(Some("2024-05-01T10:00:00Z"), None);
            assert!(!base(&win).render().contains('🕐'));
        }

        #[test]
        fn empty_title_gets_fallback() {
            let win = window(None, None);
            let msg = AlertMessage {
                title: "",
                ..base(&win)
            };
            assert!(msg.render().contains("<b>Unknown monitor</b>"));
        }

        #[test]
        fn oversized_message_capped_at_limit() {
            let win = window(None, None);
            let runbook: Vec<String> =
                (0..40).map(|i| format!("step {i}: {}", "x".repeat(250))).collect();
            let msg = AlertMessage {
                runbook: &runbook,
                ..base(&win)
            };
            let text = msg.render();
            assert_eq!(text.chars().count(), MAX_MESSAGE_CHARS);
            assert!(text.ends_with('…'));
        }
    }

    mod local_alert_tests {
        use super::*;

        #[test]
        fn title_and_body_wrapped() {
            assert_eq!(
                format_local_alert("db: disk 95%", "df -h output"),
                "🔧 <b>db: disk 95%</b>\n<code>df -h output</code>"
            );
        }

        #[test]
        fn body_escaped() {
            let text = format_local_alert("t", "<oom>");
            assert!(text.contains("<code>&lt;oom&gt;</code>"));
        }

        #[test]
        fn empty_body_omits_code_line() {
            assert_eq!(format_local_alert("watchdog", ""), "🔧 <b>watchdog</b>");
        }
    }
}
