use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use super::types::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/health", get(handlers::health_check))
}
