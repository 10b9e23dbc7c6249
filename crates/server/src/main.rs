mod api;
mod bootstrap;
mod health;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use trainwise_core::config::{AppConfig, LoadOptions};
use uuid::Uuid;

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use trainwise_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let run_id = Uuid::new_v4();

    let state = api::AppState::new(app.db_pool.clone());
    let router = health::router(app.db_pool.clone())
        .merge(api::app(state, app.config.server.static_dir.as_deref()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = %run_id,
        address = %address,
        static_dir = ?app.config.server.static_dir,
        "trainwise-server listening"
    );

    let shutdown_requested = Arc::new(Notify::new());
    let signal = {
        let shutdown_requested = Arc::clone(&shutdown_requested);
        async move {
            wait_for_shutdown().await;
            shutdown_requested.notify_one();
        }
    };
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let drain_deadline = async {
        shutdown_requested.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        served = axum::serve(listener, router).with_graceful_shutdown(signal) => {
            served.context("http server failed")?;
        }
        _ = drain_deadline => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = %run_id,
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the grace period"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = %run_id,
        "trainwise-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
