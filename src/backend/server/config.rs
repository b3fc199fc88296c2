/**
 * Server Configuration
 *
 * Configuration is layered:
 *
 * 1. Built-in defaults
 * 2. An optional TOML file named by `COMMS_CONFIG`
 * 3. Environment variables (a `.env` file is read first)
 *
 * Later layers win. The database is optional: when `DATABASE_URL` is unset
 * or unreachable the server runs on in-memory stores.
 *
 * # Example
 *
 * ```toml
 * port = 3001
 * frontend_url = "https://app.example.com"
 * environment = "development"
 * call_ring_timeout_secs = 30
 * ```
 */

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;

use crate::shared::config::validate_url;
use crate::shared::{ConfigError, Environment};

/// Secret used when `JWT_SECRET` is not configured
pub const DEV_JWT_SECRET: &str = "parttime-comms-development-secret";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub frontend_url: String,
    pub environment: Environment,
    pub call_ring_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            database_url: None,
            jwt_secret: None,
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Production,
            call_ring_timeout_secs: 45,
        }
    }
}

impl ServerConfig {
    /// Load defaults, then `COMMS_CONFIG`, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("COMMS_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_file(path.trim())?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay values from `lookup` (normally the process environment)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(url) = get("FRONTEND_URL") {
            self.frontend_url = url;
        }
        if let Some(env) = get("APP_ENV") {
            self.environment = Environment::from_str(&env)
                .ok_or(ConfigError::InvalidValue { key: "APP_ENV", value: env })?;
        }
        if let Some(secs) = get("CALL_RING_TIMEOUT_SECS") {
            self.call_ring_timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CALL_RING_TIMEOUT_SECS",
                value: secs,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.frontend_url)?;
        if self.call_ring_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CALL_RING_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// The configured secret, or the development fallback
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    pub fn ring_timeout(&self) -> Duration {
        Duration::from_secs(self.call_ring_timeout_secs)
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    /// Startup warnings about insecure fallbacks. Never includes secret values.
    pub fn fallback_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.jwt_secret.is_none() {
            warnings.push("JWT_SECRET not set; tokens are signed with the built-in development secret");
        }
        warnings
    }
}

/// Connect to Postgres and run migrations.
///
/// Returns `None` when the connection fails so the caller can fall back to
/// in-memory stores. A failed migration is logged and the pool is still used.
pub async fn load_database(database_url: &str) -> Option<PgPool> {
    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
