pub mod logging;
#[cfg(feature = "server")]
pub mod middleware;
pub mod schemas;

pub use schemas::{
    AuthResponse, AuthUser, ChatMessage, ChatRequest, Credentials, ErrorEnvelope, HealthStatus,
};
