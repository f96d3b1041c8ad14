//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `COACH_REALTIME` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use coach_realtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Push endpoint: {}", config.realtime.endpoint_url);
//! ```

mod api;
mod client;
mod error;
mod realtime;

pub use api::ApiConfig;
pub use client::{ClientConfig, Environment, LogFormat};
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults suitable for local development, so an empty
/// environment loads successfully.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Environment, logging and the startup credential
    #[serde(default)]
    pub client: ClientConfig,

    /// Notifications REST API
    #[serde(default)]
    pub api: ApiConfig,

    /// Push channel
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `COACH_REALTIME` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `COACH_REALTIME__API__BASE_URL=...` -> `api.base_url = ...`
    /// - `COACH_REALTIME__REALTIME__MAX_RECONNECT_ATTEMPTS=5` -> `realtime.max_reconnect_attempts = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COACH_REALTIME")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - URL schemes (`http(s)://` for the API, `ws(s)://` for the push channel)
    /// - Non-zero timeouts and capacities, sane backoff bounds
    /// - Production-specific requirements (HTTPS and WSS)
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        self.api.validate(self.client.environment)?;
        self.realtime.validate(self.client.environment)?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.client.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "COACH_REALTIME__CLIENT__ENVIRONMENT",
        "COACH_REALTIME__CLIENT__LOG_FORMAT",
        "COACH_REALTIME__CLIENT__ACCESS_TOKEN",
        "COACH_REALTIME__API__BASE_URL",
        "COACH_REALTIME__API__REQUEST_TIMEOUT_SECS",
        "COACH_REALTIME__REALTIME__ENDPOINT_URL",
        "COACH_REALTIME__REALTIME__MAX_RECONNECT_ATTEMPTS",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.client.environment, Environment::Development);
        assert_eq!(config.realtime.max_reconnect_attempts, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COACH_REALTIME__API__BASE_URL", "https://api.example.com");
        env::set_var("COACH_REALTIME__API__REQUEST_TIMEOUT_SECS", "5");
        env::set_var("COACH_REALTIME__REALTIME__ENDPOINT_URL", "wss://push.example.com/realtime");
        env::set_var("COACH_REALTIME__REALTIME__MAX_RECONNECT_ATTEMPTS", "3");
        env::set_var("COACH_REALTIME__CLIENT__LOG_FORMAT", "json");
        env::set_var("COACH_REALTIME__CLIENT__ACCESS_TOKEN", "token-123");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.request_timeout_secs, 5);
        assert_eq!(config.realtime.endpoint_url, "wss://push.example.com/realtime");
        assert_eq!(config.realtime.max_reconnect_attempts, 3);
        assert_eq!(config.client.log_format, LogFormat::Json);
        assert_eq!(config.client.access_token(), Some("token-123"));
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COACH_REALTIME__CLIENT__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_production_rejects_plain_transports() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COACH_REALTIME__CLIENT__ENVIRONMENT", "production");
        env::set_var("COACH_REALTIME__API__BASE_URL", "https://api.example.com");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::InsecureInProduction("REALTIME__ENDPOINT_URL"))
        );
    }
}
