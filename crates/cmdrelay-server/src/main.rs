// Command relay server binary
// Decision: Configuration comes from the environment, optionally seeded from a .env file
// Decision: Ctrl+C stops accepting connections, then the pruner is told to exit

use anyhow::{Context, Result};
use cmdrelay_core::CommandRelay;
use cmdrelay_server::{build_app, pruner, ServerConfig};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cmdrelay_server=debug,cmdrelay_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cmdrelay-server starting...");

    let config = ServerConfig::from_env();
    tracing::info!(
        filter_mode = %config.relay.mode,
        admin_match = ?config.relay.admin_match,
        max_commands = config.relay.capacity,
        poll_window_secs = config.relay.poll_window.as_secs(),
        retention_secs = config.relay.retention.as_secs(),
        auth = config.auth.is_enabled(),
        "Relay configured"
    );
    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }
    match &config.cors {
        cmdrelay_server::config::CorsConfig::Disabled => {
            tracing::info!("CORS not configured (same-origin requests only)")
        }
        cors => tracing::info!(cors = ?cors, "CORS configured"),
    }

    let relay = Arc::new(CommandRelay::new(config.relay.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pruner = pruner::spawn_pruner(relay.clone(), config.prune_interval, shutdown_rx);

    let app = build_app(relay, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("HTTP server stopped");
    let _ = shutdown_tx.send(true);
    pruner.await.context("Pruner task failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
