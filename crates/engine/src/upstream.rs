use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use stacx_shared::{ChatMessage, ChatRequest};

use crate::config::ProxyConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}")]
    Status { status: StatusCode, body: Value },

    #[error("upstream returned a body that is not JSON: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: String,
    messages: &'a [ChatMessage],
}

/// Single best-effort forward to the completions API. No retries.
#[derive(Clone)]
pub struct Upstream {
    client: Client,
    config: Arc<ProxyConfig>,
}

impl Upstream {
    pub fn new(config: Arc<ProxyConfig>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stacx-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<Value, UpstreamError> {
        let body = CompletionRequest {
            model: self.config.resolve_model(request.model.as_deref()),
            messages: &request.messages,
        };

        tracing::debug!(
            "Sending completion request: model={}, {} messages",
            body.model,
            body.messages.len()
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Pass structured upstream errors through untouched
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(UpstreamError::Status { status, body });
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}
