//! StacXai terminal client: conversations, rendering and the proxy/auth clients.

pub mod app;
pub mod attachments;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod dictation;
pub mod error;
pub mod models;
pub mod render;
pub mod session;
pub mod storage;
pub mod store;
pub mod ui;

pub use client::ApiClient;
pub use error::ClientError;
pub use store::ConversationStore;
