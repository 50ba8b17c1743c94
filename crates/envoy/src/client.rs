use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stacx_shared::{AuthResponse, AuthUser, ChatMessage, ChatRequest, Credentials, ErrorEnvelope, HealthStatus};

use crate::error::{ClientError, Result};

pub const CANNOT_CONNECT: &str = "Sorry, I cannot connect to the AI service right now. Please check if the server is running and try again.";
pub const GENERIC_FAILURE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    proxy_url: String,
    auth_url: String,
}

impl ApiClient {
    pub fn new(proxy_url: impl Into<String>, auth_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: proxy_url.into().trim_end_matches('/').to_string(),
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<T: serde::Serialize>(&self, url: String, body: &T) -> Result<Response> {
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url, source })
    }

    async fn read_body(url: &str, response: Response) -> Result<String> {
        response.text().await.map_err(|source| ClientError::Unreachable {
            url: url.to_string(),
            source,
        })
    }

    /// Sends the history and returns the assistant's reply text.
    pub async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.proxy_url);
        let request = ChatRequest {
            messages,
            model: Some(model.to_string()),
        };

        tracing::debug!("POST {} ({} messages, model={})", url, request.messages.len(), model);
        let response = self.post_json(url.clone(), &request).await?;
        let status = response.status();
        let body = Self::read_body(&url, response).await?;

        if !status.is_success() {
            tracing::warn!("Proxy returned {}: {}", status, body);
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => ClientError::Proxy {
                    details: envelope.details_text(),
                    error: envelope.error,
                },
                Err(_) => ClientError::Proxy {
                    error: status.to_string(),
                    details: None,
                },
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| ClientError::Malformed(e.to_string()))?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Malformed("missing choices[0].message.content".to_string()))
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/api/health", self.proxy_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let body = Self::read_body(&url, response).await?;
        parse(&body)
    }

    pub async fn signup(&self, creds: &Credentials) -> Result<AuthUser> {
        self.auth("signup", creds).await
    }

    pub async fn login(&self, creds: &Credentials) -> Result<AuthUser> {
        self.auth("login", creds).await
    }

    async fn auth(&self, action: &str, creds: &Credentials) -> Result<AuthUser> {
        let url = format!("{}/api/auth/{}", self.auth_url, action);
        let response = self.post_json(url.clone(), creds).await?;
        let body = Self::read_body(&url, response).await?;

        let reply: AuthResponse = parse(&body)?;
        match reply.data {
            Some(user) if reply.success => Ok(user),
            _ => Err(ClientError::Auth(reply.message)),
        }
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Malformed(e.to_string()))
}

/// Text recorded as the assistant reply, whatever happened to the request.
pub fn reply_text(outcome: Result<String>) -> String {
    match outcome {
        Ok(content) => content,
        Err(ClientError::Proxy { details, .. }) => format!(
            "Sorry, I encountered an error: {}",
            details.as_deref().unwrap_or("Please try again later.")
        ),
        Err(ClientError::Unreachable { .. }) => CANNOT_CONNECT.to_string(),
        Err(e) => {
            tracing::warn!("Chat request failed: {}", e);
            GENERIC_FAILURE.to_string()
        }
    }
}
