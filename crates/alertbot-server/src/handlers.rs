//! Request handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use alertbot_ingest::{ContextBuilder, payload};
use alertbot_telegram::{AlertMessage, format_local_alert};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::pipeline;
use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// An alert from a local watcher process.
#[derive(Debug, Deserialize)]
pub struct LocalAlert {
    /// Alert title; the service name for routing is parsed from the part
    /// after the first colon.
    pub title: String,
    /// Optional detail body, shown as a code block.
    #[serde(default)]
    pub body: String,
}

/// Accepts alerts from local services.
///
/// Answers 502 when delivery fails so the caller can fall back to sending
/// directly.
pub async fn local_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<LocalAlert>,
) -> ServerResult<Json<Value>> {
    info!(title = %alert.title, "local alert received");

    let service = alert
        .title
        .split_once(':')
        .map_or(alert.title.as_str(), |(_, rest)| rest.trim());
    let services: BTreeSet<String> = std::iter::once(service.to_string()).collect();
    let destination = state.destination(&services, &BTreeSet::new(), "");

    let text = format_local_alert(&alert.title, &alert.body);
    state
        .notifier
        .send(&text, &destination.chat_id, destination.topic_id)
        .await?;
    Ok(Json(json!({"ok": true})))
}

/// Accepts monitor webhooks and runs the full pipeline: normalize, enrich,
/// classify, route, deliver.
///
/// Delivery failures are logged but do not fail the request; the monitor
/// side has nothing useful to do with an error.
pub async fn axiom_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<Value>> {
    if !state.settings.webhook_secret.is_empty() {
        let provided = headers.get("x-webhook-secret").and_then(|v| v.to_str().ok());
        if provided != Some(state.settings.webhook_secret.as_str()) {
            return Err(ServerError::InvalidSecret);
        }
    }

    let raw: Value = serde_json::from_slice(&body).map_err(|_| ServerError::InvalidPayload)?;
    let alert = payload::extract(&raw);

    if alert.monitor_name.is_empty() {
        let keys: Vec<&String> = raw
            .as_object()
            .map(|map| map.keys().collect())
            .unwrap_or_default();
        warn!(?keys, "webhook payload missing monitor name");
    }

    if alert.status.is_resolved() && !state.include_resolved() {
        info!(
            monitor = %alert.monitor_name,
            count = ?alert.effective_count(),
            "resolved alert skipped"
        );
        return Ok(Json(json!({"ok": true})));
    }
    info!(
        status = alert.status.as_str(),
        monitor = %alert.monitor_name,
        count = ?alert.effective_count(),
        "alert received"
    );

    let mut builder = ContextBuilder::new();
    builder.extend(&alert.match_records);
    builder.ensure_service_hint(&alert.monitor_name);

    if !builder.has_messages()
        && state.axiom.is_enabled()
        && !state.settings.axiom_dataset.is_empty()
    {
        if let Some(service) = builder.service_hint().map(ToOwned::to_owned) {
            let host = builder.host_hint().map(ToOwned::to_owned);
            let rows = state
                .axiom
                .query_rows(
                    &state.settings.axiom_dataset,
                    &service,
                    host.as_deref(),
                    &alert.window,
                )
                .await;
            builder.extend(&rows);
        }
    }

    let ctx = builder.build(&alert.monitor_name, state.defaults().top_error);

    let Some(outcome) = pipeline::classify(&state.config, &ctx) else {
        info!(monitor = %ctx.title, "alert dropped by filter");
        return Ok(Json(json!({"ok": true})));
    };

    let destination = state.destination(&ctx.services, &ctx.hosts, &ctx.title);
    let samples = ctx.sample_messages(state.defaults().sample_count);
    let text = AlertMessage {
        tag: &outcome.tag,
        status: alert.status,
        title: &ctx.title,
        location: &ctx.location_label(),
        count: alert.effective_count(),
        window: &alert.window,
        top_error: ctx.top_error.as_deref(),
        samples: &samples,
        runbook: &outcome.runbook,
    }
    .render();

    if let Err(err) = state
        .notifier
        .send(&text, &destination.chat_id, destination.topic_id)
        .await
    {
        error!(error = %err, monitor = %ctx.title, "delivery failed");
    }
    Ok(Json(json!({"ok": true})))
}
