//! Tracing subscriber setup for the binary.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{ClientConfig, LogFormat};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("tracing subscriber already installed: {0}")]
    Install(String),
}

/// Builds the log filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &ClientConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.log_level)?),
    }
}

/// Installs the global subscriber in the configured format.
pub fn init_tracing(config: &ClientConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))
}
