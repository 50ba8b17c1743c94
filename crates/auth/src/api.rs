use anyhow::Result;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use stacx_shared::{AuthResponse, AuthUser, Credentials, HealthStatus, middleware::log_request};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::users::UserStore;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingFields,

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request body")]
    InvalidBody,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingFields | AuthError::InvalidBody => StatusCode::BAD_REQUEST,
            AuthError::UserExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(AuthResponse::failure(self.to_string()))).into_response()
    }
}

fn success(message: &str, user: AuthUser) -> Json<AuthResponse> {
    Json(AuthResponse {
        success: true,
        message: message.to_string(),
        data: Some(user),
    })
}

fn parse_body(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, AuthError> {
    payload.map(|Json(creds)| creds).map_err(|rejection| {
        tracing::warn!("Rejected auth request: {}", rejection.body_text());
        AuthError::InvalidBody
    })
}

pub async fn handle_signup(
    State(users): State<Arc<UserStore>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let creds = parse_body(payload)?;
    let user = users.signup(&creds).await?;
    Ok((StatusCode::CREATED, success("User created successfully", user)))
}

pub async fn handle_login(
    State(users): State<Arc<UserStore>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let creds = parse_body(payload)?;
    let user = users.login(&creds).await?;
    Ok(success("Login successful", user))
}

pub async fn health_check(State(users): State<Arc<UserStore>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        message: None,
        timestamp: Some(Utc::now().to_rfc3339()),
        users_count: Some(users.count().await),
    })
}

pub fn build_app(users: Arc<UserStore>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/auth/signup", post(handle_signup))
        .route("/api/auth/login", post(handle_login))
        .with_state(users)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

pub async fn start_server(addr: SocketAddr, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let app = build_app(Arc::new(UserStore::new()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Mock API server running on http://{}", addr);
    tracing::info!("  GET  /health, /api/health");
    tracing::info!("  POST /api/auth/signup, /api/auth/login");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_rx;
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("Shutting down mock auth server...");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn signup_body(email: &str, password: &str) -> String {
        json!({ "email": email, "password": password }).to_string()
    }

    #[tokio::test]
    async fn signup_returns_created_user_with_token() {
        let app = build_app(Arc::new(UserStore::new()));
        let (status, body) = send(&app, post("/api/auth/signup", &signup_body("ada@example.com", "secret12"))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert_eq!(body["data"]["token"], "mock-jwt-token-for-ada@example.com");
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn signup_conflict_and_validation() {
        let app = build_app(Arc::new(UserStore::new()));
        send(&app, post("/api/auth/signup", &signup_body("ada@example.com", "x"))).await;

        let (status, body) = send(&app, post("/api/auth/signup", &signup_body("ada@example.com", "y"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User already exists");

        let (status, body) = send(&app, post("/api/auth/signup", r#"{"email":"bob@example.com"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password are required");

        let (status, body) = send(&app, post("/api/auth/login", r#"{"email":null,"password":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password are required");

        let (status, body) = send(&app, post("/api/auth/signup", "not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request body");
    }

    #[tokio::test]
    async fn login_checks_password() {
        let app = build_app(Arc::new(UserStore::new()));
        send(&app, post("/api/auth/signup", &signup_body("ada@example.com", "right"))).await;

        let (status, body) = send(&app, post("/api/auth/login", &signup_body("ada@example.com", "right"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["data"]["email"], "ada@example.com");

        let (status, body) = send(&app, post("/api/auth/login", &signup_body("ada@example.com", "wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn health_reports_user_count_on_both_paths() {
        let app = build_app(Arc::new(UserStore::new()));
        send(&app, post("/api/auth/signup", &signup_body("ada@example.com", "pw"))).await;

        for uri in ["/health", "/api/health"] {
            let (status, body) = send(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["usersCount"], 1);
            assert!(body["timestamp"].is_string());
        }
    }
}
