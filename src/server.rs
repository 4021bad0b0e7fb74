use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState, SharedState};
use crate::config::{AccessPolicy, DEFAULT_HOST, DEFAULT_PORT, StorageBackend};
use crate::store;

/// Runtime configuration for the launcher server.
#[derive(Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    pub storage: StorageBackend,
    pub access: AccessPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dev_mode: false,
            storage: StorageBackend::Memory,
            access: AccessPolicy::Open,
        }
    }
}

/// Build the full application router: API routes, request tracing and a JSON 404.
pub fn build_router(state: SharedState, dev_mode: bool) -> Router {
    let mut app = api::api_router()
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}

/// A bound but not yet running server. Binding separately lets callers learn
/// the actual address when asking for port 0.
pub struct LauncherServer {
    listener: TcpListener,
    app: Router,
}

impl LauncherServer {
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        tracing::info!(storage = %config.storage.describe(), "Opening storage");
        let store = store::open(&config.storage).await?;
        let state = AppState::new(store, config.access);
        let app = build_router(state, config.dev_mode);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        Ok(Self { listener, app })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read bound address")
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")
    }
}

/// Start the launcher server and block until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let server = LauncherServer::bind(config).await?;
    let local_addr = server.local_addr()?;
    tracing::info!(%local_addr, "App launcher listening");
    println!("App launcher running at http://{}", local_addr);

    server.run_until(shutdown_signal()).await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
