//! Axiom query client.
//!
//! One bounded APL query enriches alerts that arrived without any matched
//! log rows. Enrichment is strictly best-effort: every failure path (missing
//! token, transport error, bad response shape) degrades to an empty row set
//! and the alert is formatted from whatever the webhook carried.

use std::time::Duration;

use alertbot_ingest::{MatchRecord, TimeWindow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minutes of history queried when the alert did not carry a usable range.
const FALLBACK_WINDOW_MINUTES: i64 = 5;

/// Row cap for the enrichment query.
const QUERY_LIMIT: u32 = 50;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    apl: &'a str,
    #[serde(rename = "startTime")]
    start_time: &'a str,
    #[serde(rename = "endTime")]
    end_time: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    matches: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Table {
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    columns: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct Field {
    #[serde(default)]
    name: String,
}

/// Authenticated client for the Axiom management and query APIs.
#[derive(Debug, Clone)]
pub struct AxiomClient {
    http: reqwest::Client,
    api_base: String,
    query_base: String,
    token: String,
}

impl AxiomClient {
    /// Creates a client. Trailing slashes on the base URLs are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AxiomError::Http`] if the HTTP client cannot be
    /// built.
    pub fn new(
        token: impl Into<String>,
        api_base: &str,
        query_base: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            query_base: query_base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// True when a management token is configured; without one every API
    /// call is skipped.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(&self.token)
    }

    pub(crate) fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .put(format!("{}{path}", self.api_base))
            .bearer_auth(&self.token)
    }

    /// Runs the enrichment query and returns matched rows as records.
    ///
    /// Returns an empty vec when enrichment is disabled, the inputs are
    /// insufficient, or the query fails for any reason.
    pub async fn query_rows(
        &self,
        dataset: &str,
        service: &str,
        host: Option<&str>,
        window: &TimeWindow,
    ) -> Vec<MatchRecord> {
        if !self.is_enabled() || dataset.is_empty() || service.is_empty() {
            return Vec::new();
        }

        match self.run_query(dataset, service, host, window).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, dataset, service, "enrichment query failed");
                Vec::new()
            }
        }
    }

    async fn run_query(
        &self,
        dataset: &str,
        service: &str,
        host: Option<&str>,
        window: &TimeWindow,
    ) -> Result<Vec<MatchRecord>> {
        let (start_time, end_time) = resolve_time_range(window, Utc::now());
        let apl = build_apl(service, host);
        let url = format!("{}/api/v1/datasets/{dataset}/query", self.query_base);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&QueryRequest {
                apl: &apl,
                start_time: &start_time,
                end_time: &end_time,
            })
            .send()
            .await?
            .error_for_status()?;

        let payload: QueryResponse = response.json().await?;
        Ok(decode_rows(&payload))
    }
}

/// Builds the bounded APL pipeline for one service.
fn build_apl(service: &str, host: Option<&str>) -> String {
    let mut parts = vec![format!(
        "| where service contains \"{}\"",
        escape_quotes(service)
    )];
    if let Some(host) = host.filter(|h| !h.is_empty()) {
        parts.push(format!("| where host == \"{}\"", escape_quotes(host)));
    }
    parts.push(
        "| where message contains \"ERROR\" or message contains \"error\" \
         or message contains \"Traceback\" or message contains \"Exception\" \
         or message contains \"CRITICAL\""
            .to_string(),
    );
    parts.push(
        "| project _time, host, service, message, msg, log, _raw, \
         status, status_code, code, user_agent, path, url, request_path, requestPath"
            .to_string(),
    );
    parts.push(format!("| limit {QUERY_LIMIT}"));
    parts.join(" ")
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Resolves the query window: the alert's own range when it is well-formed,
/// otherwise the trailing fallback window ending at `now`.
fn resolve_time_range(window: &TimeWindow, now: DateTime<Utc>) -> (String, String) {
    let start = window.start.as_deref().and_then(parse_time);
    let end = window.end.as_deref().and_then(parse_time);
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            return (to_rfc3339(start), to_rfc3339(end));
        }
    }
    let lookback = chrono::Duration::minutes(FALLBACK_WINDOW_MINUTES);
    (to_rfc3339(now - lookback), to_rfc3339(now))
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let cleaned = value.replace(" UTC", "+00:00");
    if let Ok(ts) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(ts.to_utc());
    }
    // Naive timestamps are taken as UTC.
    cleaned
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Decodes a query response into match records: the tabular shape first,
/// then the legacy `matches[].data` shape.
fn decode_rows(payload: &QueryResponse) -> Vec<MatchRecord> {
    let rows = rows_from_tabular(payload);
    if !rows.is_empty() {
        return rows.iter().map(MatchRecord::from_value).collect();
    }
    payload
        .matches
        .iter()
        .filter_map(|m| m.get("data"))
        .filter(|data| data.is_object())
        .map(MatchRecord::from_value)
        .collect()
}

fn rows_from_tabular(payload: &QueryResponse) -> Vec<Value> {
    let Some(table) = payload.tables.first() else {
        return Vec::new();
    };
    if table.fields.is_empty() || table.columns.is_empty() {
        return Vec::new();
    }

    let row_count = table.columns.first().map_or(0, Vec::len);
    (0..row_count)
        .map(|row_index| {
            let mut row = serde_json::Map::new();
            for (field, column) in table.fields.iter().zip(&table.columns) {
                if field.name.is_empty() {
                    continue;
                }
                if let Some(value) = column.get(row_index) {
                    row.insert(field.name.clone(), value.clone());
                }
            }
            Value::Object(row)
        })
        .collect()
}
