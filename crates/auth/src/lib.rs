//! Disposable in-memory auth server for local development.
//!
//! Passwords are kept in plaintext and everything is lost on restart.
//! Never point a real client at this.

pub mod api;
pub mod users;

pub use api::{AuthError, build_app, start_server};
pub use users::UserStore;
