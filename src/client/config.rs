//! Client configuration
//!
//! `api_url` comes from `COMMS_API_URL`, else `VITE_API_URL`, else
//! `http://localhost:3001`. The socket URL is derived from it.

use std::path::PathBuf;

use crate::shared::config::validate_url;
use crate::shared::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Explicit session file; `None` uses the user config directory
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_path: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("COMMS_API_URL")
            .or_else(|| get("VITE_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url)?;
        config.token_path = get("COMMS_TOKEN_FILE").map(PathBuf::from);
        Ok(config)
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.api_url)?;
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.api_url.clone()));
        }
        Ok(())
    }

    /// `ws(s)://<host>/socket`
    pub fn socket_url(&self) -> String {
        let base = match self.api_url.strip_prefix("https://") {
            Some(rest) => format!("wss://{}", rest),
            None => format!("ws://{}", self.api_url.trim_start_matches("http://")),
        };
        format!("{}/socket", base)
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.api_url, path)
    }
}
