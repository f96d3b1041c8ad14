//! Push channel configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::connection::ReconnectPolicy;

use super::client::Environment;
use super::error::ValidationError;

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Websocket endpoint, the token is appended as a query parameter
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Idle seconds before a ping is sent
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Seconds to wait for an answer to a ping
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// First reconnect delay in milliseconds, doubled per attempt
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound of the reconnect delay in milliseconds
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Buffered new-notification alerts per subscriber
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,

    /// Buffered events per push server room
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
            self.max_reconnect_attempts,
        )
    }

    /// Validate push channel configuration
    ///
    /// In production, requires `wss://`.
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.endpoint_url.is_empty() {
            return Err(ValidationError::MissingRequired("REALTIME__ENDPOINT_URL"));
        }
        if !self.endpoint_url.starts_with("ws://") && !self.endpoint_url.starts_with("wss://") {
            return Err(ValidationError::InvalidEndpointUrl);
        }
        if environment == Environment::Production && !self.endpoint_url.starts_with("wss://") {
            return Err(ValidationError::InsecureInProduction("REALTIME__ENDPOINT_URL"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout("REALTIME__HEARTBEAT_INTERVAL_SECS"));
        }
        if self.pong_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("REALTIME__PONG_TIMEOUT_SECS"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("REALTIME__CONNECT_TIMEOUT_SECS"));
        }
        if self.backoff_base_ms == 0 || self.backoff_base_ms > self.backoff_max_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        if self.max_reconnect_attempts == 0 {
            return Err(ValidationError::InvalidReconnectAttempts);
        }
        if self.alert_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("REALTIME__ALERT_CAPACITY"));
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("REALTIME__CHANNEL_CAPACITY"));
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            pong_timeout_secs: default_pong_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            alert_capacity: default_alert_capacity(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_endpoint_url() -> String {
    "ws://localhost:3000/realtime".to_string()
}

fn default_heartbeat_interval() -> u64 {
    25
}

fn default_pong_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_backoff_base() -> u64 {
    500
}

fn default_backoff_max() -> u64 {
    30_000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_alert_capacity() -> usize {
    32
}

fn default_channel_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_config_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(25));
        assert_eq!(config.pong_timeout(), Duration::from_secs(10));
        assert_eq!(config.reconnect_policy(), ReconnectPolicy::default());
        assert!(config.validate(Environment::Development).is_ok());
    }

    #[test]
    fn test_rejects_http_endpoint() {
        let config = RealtimeConfig {
            endpoint_url: "http://localhost:3000/realtime".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(Environment::Development),
            Err(ValidationError::InvalidEndpointUrl)
        );
    }

    #[test]
    fn test_production_requires_wss() {
        let config = RealtimeConfig::default();
        assert_eq!(
            config.validate(Environment::Production),
            Err(ValidationError::InsecureInProduction("REALTIME__ENDPOINT_URL"))
        );
    }

    #[test]
    fn test_backoff_base_above_cap_rejected() {
        let config = RealtimeConfig {
            backoff_base_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(
            config.validate(Environment::Development),
            Err(ValidationError::InvalidBackoff)
        );
    }

    #[test]
    fn test_zero_values_rejected() {
        let zero_pong = RealtimeConfig {
            pong_timeout_secs: 0,
            ..Default::default()
        };
        assert!(zero_pong.validate(Environment::Development).is_err());

        let zero_attempts = RealtimeConfig {
            max_reconnect_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            zero_attempts.validate(Environment::Development),
            Err(ValidationError::InvalidReconnectAttempts)
        );
    }
}
