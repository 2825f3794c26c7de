//! HTTP server for the REST API

use crate::api::handlers::{self, ApiState};
use crate::error::{AppError, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router with all routes
pub fn router(state: ApiState) -> Router {
    // Build CORS layer (allow all for local dashboards)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ================================================================
        // Health check
        // ================================================================
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        // ================================================================
        // Catalog and bars
        // ================================================================
        .route("/api/v1/categories", get(handlers::get_categories))
        .route("/api/v1/symbols", get(handlers::get_symbols))
        .route("/api/v1/daterange", get(handlers::get_date_range))
        .route("/api/v1/bars", post(handlers::ingest_bars))
        .route("/api/v1/bars/query", post(handlers::query_bars))
        .route("/api/v1/sessions", post(handlers::filter_sessions))
        // ================================================================
        // Zone analysis
        // ================================================================
        .route("/api/v1/zones/classify", post(handlers::classify_zones))
        .route("/api/v1/stats/retracement", post(handlers::midnight_retracement))
        .route("/api/v1/stats/zone1-retracement", post(handlers::zone1_retracement))
        .route("/api/v1/stats/day-extremes", post(handlers::day_extremes))
        .route("/api/v1/stats/direction", post(handlers::direction))
        .route("/api/v1/dashboard", post(handlers::dashboard))
        // ================================================================
        // Settings
        // ================================================================
        .route(
            "/api/v1/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server manager
pub struct ApiServer {
    state: ApiState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Create a new server
    pub fn new(state: ApiState) -> Self {
        Self {
            state,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Bind and start serving in the background
    pub async fn start(&mut self, host: &str, port: u16) -> Result<SocketAddr> {
        // Parse address
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}:{}: {}", host, port, e)))?;

        let app = router(self.state.clone());

        info!("Starting Zone Dashboard API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        // Spawn server task
        self.task = Some(tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        }));

        let base = format!("http://{}", local_addr);
        info!("Zone Dashboard API server started successfully");
        info!("");
        info!("=== Endpoints ===");
        info!("  GET  {}/health", base);
        info!("Catalog:");
        info!("  GET  {}/api/v1/categories", base);
        info!("  GET  {}/api/v1/symbols?category=", base);
        info!("  GET  {}/api/v1/daterange", base);
        info!("  POST {}/api/v1/bars", base);
        info!("  POST {}/api/v1/bars/query", base);
        info!("  POST {}/api/v1/sessions", base);
        info!("Zone analysis:");
        info!("  POST {}/api/v1/zones/classify", base);
        info!("  POST {}/api/v1/stats/retracement", base);
        info!("  POST {}/api/v1/stats/zone1-retracement", base);
        info!("  POST {}/api/v1/stats/day-extremes", base);
        info!("  POST {}/api/v1/stats/direction", base);
        info!("  POST {}/api/v1/dashboard", base);
        info!("Settings:");
        info!("  GET/POST {}/api/v1/settings", base);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Wait for the server task to finish
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("API server task failed: {}", e);
            }
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_start_and_stop_on_ephemeral_port() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let mut server = ApiServer::new(state);

        let addr = server.start("127.0.0.1", 0).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.is_running());

        server.stop();
        assert!(!server.is_running());
        server.wait().await;
    }

    #[tokio::test]
    async fn test_invalid_address_is_a_config_error() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let mut server = ApiServer::new(state);
        let err = server.start("not a host", 80).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
