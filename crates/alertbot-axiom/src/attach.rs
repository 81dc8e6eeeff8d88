//! Monitor/notifier reconciliation.
//!
//! Monitors created in the Axiom UI often ship without a notifier, so their
//! alerts never reach the webhook. The reconciliation pass attaches the
//! first configured notifier to every monitor that has none, on a fixed
//! interval, independent of alert processing.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::client::AxiomClient;
use crate::error::{AxiomError, Result};

#[derive(Debug, Deserialize)]
struct NotifierInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MonitorSummary {
    id: String,
    #[serde(default, rename = "notifierIds")]
    notifier_ids: Vec<String>,
}

/// Runs one reconciliation pass, returning the number of monitors updated.
///
/// # Errors
///
/// Returns [`AxiomError`] on any API failure; a partial pass leaves already
/// updated monitors attached.
pub async fn attach_notifiers_once(client: &AxiomClient) -> Result<usize> {
    if !client.is_enabled() {
        return Ok(0);
    }

    let notifiers: Vec<NotifierInfo> = client
        .get("/v2/notifiers")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let Some(notifier) = notifiers.first() else {
        warn!("no notifiers configured, nothing to attach");
        return Ok(0);
    };

    let monitors: Vec<MonitorSummary> = client
        .get("/v2/monitors")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut updated = 0;
    for monitor in monitors.iter().filter(|m| m.notifier_ids.is_empty()) {
        attach_one(client, &monitor.id, &notifier.id).await?;
        updated += 1;
    }
    Ok(updated)
}

/// Fetches the monitor, rewrites its notifier list, and writes it back.
/// Server-owned fields are stripped before the update.
async fn attach_one(client: &AxiomClient, monitor_id: &str, notifier_id: &str) -> Result<()> {
    let detail: Value = client
        .get(&format!("/v2/monitors/{monitor_id}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Value::Object(mut payload) = detail else {
        return Err(AxiomError::UnexpectedResponse("monitor detail is not an object"));
    };
    payload.remove("id");
    payload.remove("createdAt");
    payload.insert(
        "notifierIds".to_string(),
        Value::Array(vec![Value::String(notifier_id.to_string())]),
    );

    client
        .put(&format!("/v2/monitors/{monitor_id}"))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Periodic reconciliation driver. The first pass runs immediately; the loop
/// exits when `shutdown` flips to true or its sender is dropped.
pub async fn run_attach_loop(
    client: AxiomClient,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match attach_notifiers_once(&client).await {
                    Ok(0) => {}
                    Ok(updated) => info!(updated, "attached notifier to monitors"),
                    Err(err) => error!(error = %err, "notifier reconciliation failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod shape_tests {
        use super::*;

        #[test]
        fn monitor_summary_tolerates_missing_notifier_ids() {
            let monitor: MonitorSummary =
                serde_json::from_str(r#"{"id": "m1"}"#).expect("deserializes");
            assert_eq!(monitor.id, "m1");
            assert!(monitor.notifier_ids.is_empty());
        }

        #[test]
        fn monitor_summary_reads_camel_case() {
            let monitor: MonitorSummary =
                serde_json::from_str(r#"{"id": "m1", "notifierIds": ["n1"]}"#)
                    .expect("deserializes");
            assert_eq!(monitor.notifier_ids, vec!["n1"]);
        }
    }

    mod loop_tests {
        use super::*;

        #[tokio::test]
        async fn shutdown_stops_the_loop() {
            let client = AxiomClient::new("", "http://127.0.0.1:0", "http://127.0.0.1:0")
                .expect("client");
            let (tx, rx) = watch::channel(false);
            let handle = tokio::spawn(run_attach_loop(
                client,
                Duration::from_secs(3600),
                rx,
            ));
            tx.send(true).expect("receiver alive");
            handle.await.expect("loop exits cleanly");
        }
    }
}
