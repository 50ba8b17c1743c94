use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;
use stacx_shared::{ChatRequest, HealthStatus};

use super::types::{AppState, ProxyError};

pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    // Checked before the body so a misconfigured server never reaches upstream
    let Some(api_key) = state.config.api_key.as_deref() else {
        tracing::error!("OPENROUTER_API_KEY is missing, refusing chat request");
        return Err(ProxyError::MissingCredential);
    };

    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("Rejected chat request: {}", rejection.body_text());
        ProxyError::InvalidRequest(rejection.body_text())
    })?;

    tracing::info!(
        "Forwarding chat request: {} messages, model={:?}",
        req.messages.len(),
        req.model
    );

    let body = state.upstream.complete(api_key, &req).await.map_err(|e| {
        tracing::error!("Upstream API error: {}", e);
        ProxyError::from(e)
    })?;

    Ok(Json(body))
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        message: Some("StacXai API server is running".to_string()),
        timestamp: None,
        users_count: None,
    })
}
