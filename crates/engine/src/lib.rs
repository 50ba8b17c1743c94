pub mod api;
pub mod config;
pub mod upstream;

pub use config::ProxyConfig;
