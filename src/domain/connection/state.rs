//! ConnectionState enum for the push channel lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle state of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// Returns true while a session is live or being established.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl StateMachine for ConnectionState {
    /// Valid transitions:
    /// - Disconnected -> Connecting, Error
    /// - Connecting -> Connected, Error, Disconnected
    /// - Connected -> Disconnected, Error
    /// - Error -> Disconnected, Connecting, Connected
    ///
    /// Error -> Connected covers a transient transport error followed by a
    /// healthy frame on the same socket.
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Disconnected, Error)
                | (Connecting, Connected)
                | (Connecting, Error)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Connected, Error)
                | (Error, Disconnected)
                | (Error, Connecting)
                | (Error, Connected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting, Error],
            Connecting => vec![Connected, Error, Disconnected],
            Connected => vec![Disconnected, Error],
            Error => vec![Disconnected, Connecting, Connected],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}
