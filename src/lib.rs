//! Zone Dashboard - Futures Session Zone Analytics
//!
//! Stores 1-minute OHLCV bars of futures contracts in DuckDB and serves
//! zone-relationship statistics over a REST API.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;

use api::ApiServer;
use config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, open the databases and serve until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zone_dashboard_lib=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Zone Dashboard...");

    let config = AppConfig::from_env();
    let app_state = Arc::new(AppState::new(config)?);

    // Environment overrides win over stored settings
    let settings = app_state.settings()?;
    let host = app_state
        .config
        .host
        .clone()
        .unwrap_or_else(|| settings.server_host.clone());
    let port = app_state.config.port.unwrap_or(settings.server_port);

    tracing::info!("Application state initialized");

    let mut server = ApiServer::new(app_state);
    server.start(&host, port).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received");

    server.stop();
    server.wait().await;

    tracing::info!("Zone Dashboard stopped");
    Ok(())
}
