use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use stacx_shared::AuthUser;

use crate::error::{ClientError, Result};
use crate::storage::{Storage, USER_KEY};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub const MIN_LOGIN_PASSWORD: usize = 6;
pub const MIN_SIGNUP_PASSWORD: usize = 8;
pub const MIN_NAME: usize = 2;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub token: String,
}

impl User {
    pub fn from_auth(auth: AuthUser, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name(&auth.email));

        Self {
            id: auth.id,
            email: auth.email,
            name,
            token: auth.token,
        }
    }

    pub fn first_name(&self) -> &str {
        self.name.split(' ').next().unwrap_or(&self.name)
    }
}

/// Local part of the address.
pub fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn invalid(message: &str) -> ClientError {
    ClientError::Validation(message.to_string())
}

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(invalid("Please enter a valid email address"))
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(invalid("Please fill in all fields"));
    }
    validate_email(email)?;
    if password.chars().count() < MIN_LOGIN_PASSWORD {
        return Err(invalid("Password must be at least 6 characters"));
    }
    Ok(())
}

pub fn validate_signup(name: &str, email: &str, password: &str, confirm: &str) -> Result<()> {
    if name.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(invalid("Please fill in all fields"));
    }
    if name.chars().count() < MIN_NAME {
        return Err(invalid("Name must be at least 2 characters"));
    }
    validate_email(email)?;
    if password.chars().count() < MIN_SIGNUP_PASSWORD {
        return Err(invalid("Password must be at least 8 characters"));
    }
    if password != confirm {
        return Err(invalid("Passwords do not match"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn label(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Weak",
            PasswordStrength::Medium => "Medium",
            PasswordStrength::Strong => "Strong",
        }
    }
}

/// One point each for length, lowercase, uppercase, digit and symbol.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= MIN_SIGNUP_PASSWORD,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| "$@#&!".contains(c)),
    ];

    match checks.iter().filter(|ok| **ok).count() {
        0..=2 => PasswordStrength::Weak,
        3 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}

pub fn time_greeting(hour: u32) -> &'static str {
    match hour {
        h if h < 12 => "Good Morning",
        h if h < 18 => "Good Afternoon",
        _ => "Good Evening",
    }
}

/// Greeting shown over an empty conversation. Guests get none.
pub fn greeting(user: Option<&User>, hour: u32) -> Option<String> {
    user.map(|u| format!("{}, {}", time_greeting(hour), u.first_name()))
}

fn read_user(storage: &dyn Storage) -> Result<Option<User>> {
    match storage.get_item(USER_KEY)? {
        None => Ok(None),
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved user: {}", e);
                Ok(None)
            }
        },
    }
}

/// Remembered user first, then this session's.
pub fn load_user(durable: &dyn Storage, session: &dyn Storage) -> Result<Option<User>> {
    match read_user(durable)? {
        Some(user) => Ok(Some(user)),
        None => read_user(session),
    }
}

pub fn save_user(
    user: &User,
    remember: bool,
    durable: &dyn Storage,
    session: &dyn Storage,
) -> Result<()> {
    let raw = serde_json::to_string(user)?;
    if remember {
        durable.set_item(USER_KEY, &raw)
    } else {
        session.set_item(USER_KEY, &raw)
    }
}

pub fn clear_user(durable: &dyn Storage, session: &dyn Storage) -> Result<()> {
    durable.remove_item(USER_KEY)?;
    session.remove_item(USER_KEY)
}
