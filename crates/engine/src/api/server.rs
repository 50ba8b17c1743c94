use anyhow::Result;
use axum::{Router, middleware};
use stacx_shared::middleware::log_request;
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use super::routes::create_router;
use super::types::AppState;
use crate::config::ProxyConfig;

pub fn build_app(state: AppState) -> Router {
    create_router()
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

pub async fn start_server(config: ProxyConfig, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 StacXai API server running on http://localhost:{}", addr.port());
    tracing::info!("📡 Health check: http://localhost:{}/api/health", addr.port());

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    tracing::info!("Shutting down API server...");
}
