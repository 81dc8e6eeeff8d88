//! Payload normalization.
//!
//! Upstream webhook payloads are deeply heterogeneous: the same logical field
//! can appear under a dozen key paths, at the top level, inside a nested
//! `event` object, or inside a string-encoded JSON body carried by that
//! event. [`extract`] searches a fixed, ordered candidate table per field and
//! takes the first non-empty hit, so identical payloads always normalize to
//! the same [`NormalizedAlert`].

use serde_json::Value;

use crate::types::{AlertStatus, MatchRecord, NormalizedAlert, TimeWindow};

/// Which of the candidate root objects a key path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    /// The payload itself.
    Payload,
    /// The nested `event` object.
    Event,
    /// The decoded `event.body`, when it is an object or a JSON string.
    Body,
}

/// One `(root, key path)` lookup candidate. Order within a table is the
/// alias priority and must not be reshuffled.
type Candidate = (Root, &'static [&'static str]);

const MONITOR_NAME: &[Candidate] = &[
    (Root::Payload, &["name"]),
    (Root::Payload, &["monitorName"]),
    (Root::Payload, &["monitor", "name"]),
    (Root::Payload, &["alert", "monitor", "name"]),
    (Root::Payload, &["alert", "monitorName"]),
    (Root::Event, &["title"]),
    (Root::Event, &["monitor", "name"]),
    (Root::Event, &["monitorName"]),
    (Root::Event, &["alert", "monitor", "name"]),
    (Root::Event, &["alert", "monitorName"]),
    (Root::Body, &["name"]),
    (Root::Body, &["title"]),
    (Root::Body, &["monitor", "name"]),
    (Root::Body, &["monitorName"]),
    (Root::Body, &["alert", "monitor", "name"]),
    (Root::Body, &["alert", "monitorName"]),
];

const MATCHED_COUNT: &[Candidate] = &[
    (Root::Payload, &["matchedCount"]),
    (Root::Payload, &["alert", "matchedCount"]),
    (Root::Payload, &["alert", "matchCount"]),
    (Root::Payload, &["matches", "count"]),
    (Root::Payload, &["result", "count"]),
    (Root::Event, &["value"]),
    (Root::Event, &["valueString"]),
    (Root::Event, &["extraCount"]),
    (Root::Event, &["matchedCount"]),
    (Root::Event, &["alert", "matchedCount"]),
    (Root::Event, &["alert", "matchCount"]),
    (Root::Event, &["matches", "count"]),
    (Root::Event, &["result", "count"]),
    (Root::Body, &["matchedCount"]),
    (Root::Body, &["alert", "matchedCount"]),
    (Root::Body, &["alert", "matchCount"]),
    (Root::Body, &["matches", "count"]),
    (Root::Body, &["result", "count"]),
];

const WINDOW_START: &[Candidate] = &[
    (Root::Payload, &["queryStartTime"]),
    (Root::Payload, &["alert", "window", "start"]),
    (Root::Payload, &["window", "start"]),
    (Root::Payload, &["query", "startTime"]),
    (Root::Payload, &["startTime"]),
    (Root::Event, &["queryStartTime"]),
    (Root::Event, &["alert", "window", "start"]),
    (Root::Event, &["window", "start"]),
    (Root::Event, &["query", "startTime"]),
    (Root::Event, &["startTime"]),
    (Root::Body, &["queryStartTime"]),
    (Root::Body, &["alert", "window", "start"]),
    (Root::Body, &["window", "start"]),
    (Root::Body, &["query", "startTime"]),
    (Root::Body, &["startTime"]),
];

const WINDOW_END: &[Candidate] = &[
    (Root::Payload, &["queryEndTime"]),
    (Root::Payload, &["alert", "window", "end"]),
    (Root::Payload, &["window", "end"]),
    (Root::Payload, &["query", "endTime"]),
    (Root::Payload, &["endTime"]),
    (Root::Event, &["queryEndTime"]),
    (Root::Event, &["alert", "window", "end"]),
    (Root::Event, &["window", "end"]),
    (Root::Event, &["query", "endTime"]),
    (Root::Event, &["endTime"]),
    (Root::Body, &["queryEndTime"]),
    (Root::Body, &["alert", "window", "end"]),
    (Root::Body, &["window", "end"]),
    (Root::Body, &["query", "endTime"]),
    (Root::Body, &["endTime"]),
];

/// Known locations of the matched-record list, probed per root in order.
const MATCH_LIST_PATHS: &[&[&str]] = &[
    &["queryResult", "matches"],
    &["result", "matches"],
    &["matches", "matches"],
    &["alert", "matches"],
    &["matches"],
];

/// The resolved candidate roots of one payload.
struct Roots<'a> {
    payload: &'a Value,
    event: Option<&'a Value>,
    body: Option<Value>,
}

impl<'a> Roots<'a> {
    fn of(payload: &'a Value) -> Self {
        let event = payload.get("event").filter(|e| e.is_object());
        let body = event.and_then(decode_event_body);
        Self {
            payload,
            event,
            body,
        }
    }

    fn get(&self, root: Root) -> Option<&Value> {
        match root {
            Root::Payload => Some(self.payload),
            Root::Event => self.event,
            Root::Body => self.body.as_ref(),
        }
    }
}

/// Decodes `event.body`: already an object, or a JSON string holding one.
fn decode_event_body(event: &Value) -> Option<Value> {
    match event.get("body") {
        Some(body @ Value::Object(_)) => Some(body.clone()),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Object(_)) => Some(parsed),
            _ => None,
        },
        _ => None,
    }
}

/// Walks a key path through nested objects.
fn get_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// First candidate resolving to a non-empty scalar, in table order.
fn first_scalar(roots: &Roots<'_>, candidates: &[Candidate]) -> Option<String> {
    candidates.iter().find_map(|(root, path)| {
        let value = get_path(roots.get(*root)?, path)?;
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

/// Like [`first_scalar`], but unwraps `{count: N}` objects and coerces the
/// result to an integer where possible.
fn first_count(roots: &Roots<'_>, candidates: &[Candidate]) -> Option<u64> {
    candidates.iter().find_map(|(root, path)| {
        let mut value = get_path(roots.get(*root)?, path)?;
        if value.is_object() {
            value = value.get("count")?;
        }
        match value {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    })
}

/// Locates the matched-record list: the first of the five known locations
/// holding a list wins, probed per root. A payload without any list is valid
/// and yields no records.
fn find_match_records(roots: &Roots<'_>) -> Vec<MatchRecord> {
    for root in [Root::Payload, Root::Event, Root::Body] {
        let Some(root_value) = roots.get(root) else {
            continue;
        };
        for path in MATCH_LIST_PATHS {
            if let Some(Value::Array(items)) = get_path(root_value, path) {
                return items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(MatchRecord::from_value)
                    .collect();
            }
        }
    }
    Vec::new()
}

/// Splits a `"triggered: "` / `"resolved: "` prefix off a monitor name.
///
/// The prefix check is case-insensitive. Without a recognized prefix the
/// status is [`AlertStatus::Unknown`] and the name is returned untouched.
#[must_use]
pub fn split_status(name: &str) -> (AlertStatus, String) {
    if let Some((prefix, rest)) = name.split_once(": ") {
        match prefix.to_lowercase().as_str() {
            "triggered" => return (AlertStatus::Triggered, rest.to_string()),
            "resolved" => return (AlertStatus::Resolved, rest.to_string()),
            _ => {}
        }
    }
    (AlertStatus::Unknown, name.to_string())
}

/// Extracts a [`NormalizedAlert`] from an arbitrary webhook payload.
///
/// Never fails: unknown keys are ignored, missing fields degrade to their
/// empty representation. A payload without a recoverable monitor name yields
/// an empty name, which downstream routing sends to the defaults.
#[must_use]
pub fn extract(payload: &Value) -> NormalizedAlert {
    let roots = Roots::of(payload);

    let raw_name = first_scalar(&roots, MONITOR_NAME).unwrap_or_default();
    let (status, monitor_name) = split_status(&raw_name);

    let match_records = find_match_records(&roots);
    let matched_count = first_count(&roots, MATCHED_COUNT);

    NormalizedAlert {
        monitor_name,
        status,
        matched_count,
        window: TimeWindow {
            start: first_scalar(&roots, WINDOW_START),
            end: first_scalar(&roots, WINDOW_END),
        },
        match_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    mod name_extraction_tests {
        use super::*;

        #[test]
        fn top_level_name_wins() {
            let alert = extract(&json!({
                "name": "api errors",
                "monitorName": "ignored",
                "event": {"title": "also ignored"},
            }));
            assert_eq!(alert.monitor_name, "api errors");
        }

        #[test]
        fn event_title_used_when_top_level_missing() {
            let alert = extract(&json!({"event": {"title": "db latency"}}));
            assert_eq!(alert.monitor_name, "db latency");
        }

        #[test]
        fn string_encoded_body_equivalent_to_inline() {
            let inline = json!({"event": {"body": {"name": "queue depth", "matchedCount": 3}}});
            let encoded = json!({
                "event": {"body": "{\"name\":\"queue depth\",\"matchedCount\":3}"}
            });
            assert_eq!(extract(&inline), extract(&encoded));
            assert_eq!(extract(&encoded).monitor_name, "queue depth");
            assert_eq!(extract(&encoded).matched_count, Some(3));
        }

        #[test]
        fn nested_monitor_object_paths() {
            let alert = extract(&json!({"alert": {"monitor": {"name": "disk full"}}}));
            assert_eq!(alert.monitor_name, "disk full");
        }

        #[test]
        fn missing_name_yields_empty() {
            let alert = extract(&json!({"unrelated": true}));
            assert_eq!(alert.monitor_name, "");
            assert_eq!(alert.status, AlertStatus::Unknown);
        }

        #[test]
        fn malformed_body_string_ignored() {
            let alert = extract(&json!({"event": {"body": "{not json", "title": "fallback"}}));
            assert_eq!(alert.monitor_name, "fallback");
        }
    }

    mod status_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("Triggered: api errors", AlertStatus::Triggered, "api errors"; "triggered prefix")]
        #[test_case("resolved: api errors", AlertStatus::Resolved, "api errors"; "resolved lowercase")]
        #[test_case("RESOLVED: api errors", AlertStatus::Resolved, "api errors"; "resolved uppercase")]
        #[test_case("warning: api errors", AlertStatus::Unknown, "warning: api errors"; "unrecognized prefix kept")]
        #[test_case("api errors", AlertStatus::Unknown, "api errors"; "no prefix")]
        fn status_prefix(name: &str, status: AlertStatus, rest: &str) {
            assert_eq!(split_status(name), (status, rest.to_string()));
        }
    }

    mod count_tests {
        use super::*;

        #[test]
        fn numeric_count() {
            let alert = extract(&json!({"matchedCount": 12}));
            assert_eq!(alert.matched_count, Some(12));
        }

        #[test]
        fn string_count_parsed() {
            let alert = extract(&json!({"event": {"valueString": "4"}}));
            assert_eq!(alert.matched_count, Some(4));
        }

        #[test]
        fn count_object_unwrapped() {
            let alert = extract(&json!({"matches": {"count": 9}}));
            assert_eq!(alert.matched_count, Some(9));
        }

        #[test]
        fn unparseable_count_skipped() {
            let alert = extract(&json!({"event": {"valueString": "lots"}}));
            assert_eq!(alert.matched_count, None);
        }
    }

    mod match_record_tests {
        use super::*;

        #[test]
        fn query_result_matches_found() {
            let alert = extract(&json!({
                "queryResult": {"matches": [
                    {"data": {"host": "web-1", "message": "boom"}},
                    {"data": {"host": "web-2", "message": "bang"}},
                ]}
            }));
            assert_eq!(alert.match_records.len(), 2);
            assert_eq!(alert.match_records[0].host.as_deref(), Some("web-1"));
        }

        #[test]
        fn top_level_matches_found() {
            let alert = extract(&json!({"matches": [{"message": "x"}]}));
            assert_eq!(alert.match_records.len(), 1);
        }

        #[test]
        fn non_object_items_filtered() {
            let alert = extract(&json!({"matches": ["stray", {"message": "kept"}]}));
            assert_eq!(alert.match_records.len(), 1);
            assert_eq!(alert.match_records[0].message.as_deref(), Some("kept"));
        }

        #[test]
        fn zero_records_is_valid() {
            let alert = extract(&json!({"name": "quiet monitor"}));
            assert!(alert.match_records.is_empty());
            assert_eq!(alert.monitor_name, "quiet monitor");
        }
    }

    mod window_tests {
        use super::*;

        #[test]
        fn window_from_query_times() {
            let alert = extract(&json!({
                "queryStartTime": "2024-05-01T10:00:00Z",
                "queryEndTime": "2024-05-01T10:05:00Z",
            }));
            assert_eq!(alert.window.start.as_deref(), Some("2024-05-01T10:00:00Z"));
            assert_eq!(alert.window.end.as_deref(), Some("2024-05-01T10:05:00Z"));
            assert!(alert.window.is_complete());
        }

        #[test]
        fn nested_window_object() {
            let alert = extract(&json!({"alert": {"window": {"start": "a", "end": "b"}}}));
            assert_eq!(alert.window.start.as_deref(), Some("a"));
            assert_eq!(alert.window.end.as_deref(), Some("b"));
        }
    }

    mod determinism_tests {
        use super::*;

        proptest! {
            /// Extraction is total: any JSON value normalizes without panicking,
            /// and doing it twice yields the same alert.
            #[test]
            fn extract_never_panics(raw in "\\PC{0,200}") {
                let payload = serde_json::from_str::<Value>(&raw)
                    .unwrap_or_else(|_| json!({ "name": raw }));
                let first = extract(&payload);
                let second = extract(&payload);
                prop_assert_eq!(first, second);
            }
        }
    }
}
