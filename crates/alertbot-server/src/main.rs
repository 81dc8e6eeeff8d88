//! Alertbot server binary.

use std::sync::Arc;
use std::time::Duration;

use alertbot_server::{AppState, Settings, create_router};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse();
    let bind_addr = settings.bind_addr;
    let attach_interval = Duration::from_secs(settings.axiom_attach_interval_seconds);

    let state = match AppState::from_settings(settings) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!(error = %err, "startup failed");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if state.axiom.is_enabled() {
        info!(interval_secs = attach_interval.as_secs(), "notifier reconciliation enabled");
        tokio::spawn(alertbot_axiom::run_attach_loop(
            state.axiom.clone(),
            attach_interval,
            shutdown_rx,
        ));
    } else {
        info!("no axiom management token, notifier reconciliation disabled");
    }

    let app = create_router(state);
    info!(addr = %bind_addr, "starting alertbot");

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %bind_addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };

    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install shutdown handler");
        }
    });
    if let Err(err) = serve.await {
        error!(error = %err, "server error");
    }

    let _ = shutdown_tx.send(true);
    info!("alertbot stopped");
}
