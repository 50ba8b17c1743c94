use anyhow::Result;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use stacx_shared::ErrorEnvelope;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::upstream::{Upstream, UpstreamError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Upstream,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let config = Arc::new(config);
        let upstream = Upstream::new(config.clone())?;
        Ok(Self { config, upstream })
    }
}

/// Failures surfaced to callers as `{ error, details }`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Server configuration error: API key missing")]
    MissingCredential,

    #[error("Invalid request body")]
    InvalidRequest(String),

    #[error("Failed to get response from upstream")]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::MissingCredential | ProxyError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Value {
        match self {
            ProxyError::MissingCredential => {
                Value::String("OPENROUTER_API_KEY is not set on the server".to_string())
            }
            ProxyError::InvalidRequest(reason) => Value::String(reason.clone()),
            ProxyError::Upstream(UpstreamError::Status { body, .. }) => body.clone(),
            ProxyError::Upstream(other) => Value::String(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::new(self.to_string(), Some(self.details()));
        (self.status(), Json(envelope)).into_response()
    }
}
