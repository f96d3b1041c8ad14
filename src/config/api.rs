//! REST API configuration

use serde::Deserialize;
use std::time::Duration;

use super::client::Environment;
use super::error::ValidationError;

/// Notifications REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `/notifications` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate API configuration
    ///
    /// In production, requires HTTPS.
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("API__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidApiUrl);
        }
        if environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InsecureInProduction("API__BASE_URL"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("API__REQUEST_TIMEOUT_SECS"));
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.validate(Environment::Development).is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = ApiConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(Environment::Development),
            Err(ValidationError::InvalidApiUrl)
        );
    }

    #[test]
    fn test_production_requires_https() {
        let config = ApiConfig::default();
        assert!(config.validate(Environment::Production).is_err());

        let config = ApiConfig {
            base_url: "https://api.example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate(Environment::Production).is_ok());
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let config = ApiConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate(Environment::Development).is_err());

        let config = ApiConfig {
            request_timeout_secs: 500,
            ..Default::default()
        };
        assert!(config.validate(Environment::Development).is_err());
    }
}
