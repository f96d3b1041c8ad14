//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid API base URL, expected http:// or https://")]
    InvalidApiUrl,

    #[error("Invalid realtime endpoint URL, expected ws:// or wss://")]
    InvalidEndpointUrl,

    #[error("{0} must use a secure scheme in production")]
    InsecureInProduction(&'static str),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    #[error("Backoff base delay must be non-zero and not exceed the maximum delay")]
    InvalidBackoff,

    #[error("Max reconnect attempts must be at least 1")]
    InvalidReconnectAttempts,

    #[error("Channel capacity must be at least 1: {0}")]
    InvalidCapacity(&'static str),
}
