pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::{build_app, start_server};
pub use types::{AppState, ProxyError};
