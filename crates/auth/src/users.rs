use chrono::{DateTime, Utc};
use stacx_shared::{AuthUser, Credentials};
use tokio::sync::RwLock;

use crate::api::AuthError;

#[derive(Clone, Debug)]
struct User {
    id: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl User {
    fn public(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: self.email.clone(),
            token: mock_token(&self.email),
        }
    }
}

pub fn mock_token(email: &str) -> String {
    format!("mock-jwt-token-for-{}", email)
}

#[derive(Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn signup(&self, creds: &Credentials) -> Result<AuthUser, AuthError> {
        let (email, password) = required(creds)?;

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now();
        // Ids are creation millis, bumped so two signups in one tick stay distinct
        let mut id = now.timestamp_millis();
        if let Some(last) = users.last().and_then(|u| u.id.parse::<i64>().ok()) {
            id = id.max(last + 1);
        }

        let user = User {
            id: id.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            created_at: now,
        };
        tracing::info!("New user created: email={}, id={}", user.email, user.id);

        let public = user.public();
        users.push(user);
        Ok(public)
    }

    pub async fn login(&self, creds: &Credentials) -> Result<AuthUser, AuthError> {
        let (email, password) = required(creds)?;

        let users = self.users.read().await;
        match users.iter().find(|u| u.email == email) {
            Some(user) if user.password == password => {
                tracing::debug!(
                    "Login for {} (registered {})",
                    user.email,
                    user.created_at.to_rfc3339()
                );
                Ok(user.public())
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

fn required(creds: &Credentials) -> Result<(&str, &str), AuthError> {
    if creds.email.is_empty() || creds.password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    Ok((creds.email.as_str(), creds.password.as_str()))
}
