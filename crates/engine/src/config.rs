use anyhow::{Result, anyhow};
use std::fmt;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_REFERER: &str = "https://stacxai.com";
pub const DEFAULT_APP_TITLE: &str = "StacXai";

/// Proxy settings, read from the process environment (after `.env` is loaded).
#[derive(Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub referer: String,
    pub app_title: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

// Never print the key itself
impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("referer", &self.referer)
            .field("app_title", &self.app_title)
            .finish()
    }
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow!("Invalid PORT '{}': {}", raw, e))?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            api_key: get("OPENROUTER_API_KEY"),
            base_url: get("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            default_model: get("STACX_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            referer: get("STACX_REFERER").unwrap_or(defaults.referer),
            app_title: get("STACX_APP_TITLE").unwrap_or(defaults.app_title),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Upstream ids look like `vendor/model`; display labels and absent values
    /// fall back to the default model.
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(model) if is_upstream_model_id(model) => model.to_string(),
            _ => self.default_model.clone(),
        }
    }
}

fn is_upstream_model_id(model: &str) -> bool {
    match model.split_once('/') {
        Some((vendor, name)) => {
            !vendor.is_empty() && !name.is_empty() && !model.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ProxyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3001);
        assert!(!config.has_credential());
        assert_eq!(
            config.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(config.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn reads_overrides() {
        let config = ProxyConfig::from_lookup(lookup(&[
            ("PORT", "4000"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_BASE_URL", "http://localhost:9999/v1/"),
            ("STACX_APP_TITLE", "Test"),
        ]))
        .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.completions_url(),
            "http://localhost:9999/v1/chat/completions"
        );
        assert_eq!(config.app_title, "Test");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = ProxyConfig::from_lookup(lookup(&[("OPENROUTER_API_KEY", "   ")])).unwrap();
        assert!(!config.has_credential());
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(ProxyConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn debug_output_redacts_key() {
        let config =
            ProxyConfig::from_lookup(lookup(&[("OPENROUTER_API_KEY", "sk-secret")])).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn resolves_models() {
        let config = ProxyConfig::default();
        assert_eq!(config.resolve_model(None), DEFAULT_MODEL);
        assert_eq!(config.resolve_model(Some("Chat Model")), DEFAULT_MODEL);
        assert_eq!(config.resolve_model(Some("/gpt")), DEFAULT_MODEL);
        assert_eq!(
            config.resolve_model(Some("openai/gpt-4o-mini")),
            "openai/gpt-4o-mini"
        );
    }
}
