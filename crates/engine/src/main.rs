use anyhow::Result;
use tokio::sync::watch;

use stacx_engine::api;
use stacx_engine::config::ProxyConfig;
use stacx_shared::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before logging so RUST_LOG may live there too
    let dotenv = dotenvy::dotenv();
    logging::init("stacx_engine=info,stacx_shared=info");

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found, using process environment"),
        Err(e) => tracing::warn!("Error loading .env file: {}", e),
    }

    let config = ProxyConfig::from_env()?;
    if config.has_credential() {
        tracing::info!("Upstream credential loaded");
    } else {
        tracing::error!("OPENROUTER_API_KEY is not set; chat requests will fail");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut api_handle = tokio::spawn(api::start_server(config, shutdown_rx));

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("Received shutdown signal...");
            let _ = shutdown_tx.send(true);
            if let Ok(Err(e)) = (&mut api_handle).await {
                tracing::error!("API server crashed: {}", e);
            }
        }
        res = &mut api_handle => {
            // Server exited on its own, typically a bind failure
            res??;
        }
    }

    tracing::info!("StacXai proxy shutdown complete.");
    Ok(())
}
