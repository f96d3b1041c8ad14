//! Error taxonomy of the notification core.

use std::fmt;
use thiserror::Error;

/// The user-initiated command a `MutationFailed` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    MarkRead,
    MarkAllRead,
    Delete,
    DeleteAll,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationKind::MarkRead => "mark as read",
            MutationKind::MarkAllRead => "mark all as read",
            MutationKind::Delete => "delete",
            MutationKind::DeleteAll => "delete all",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by the connection manager and the notification store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// Push channel failed and automatic recovery gave up.
    #[error("push connection failed: {0}")]
    Connection(String),

    /// The credential was rejected by the REST API or the push handshake.
    #[error("credential rejected, session expired")]
    AuthExpired,

    /// A command did not take effect; any optimistic change was rolled back.
    #[error("{operation} failed: {reason}")]
    MutationFailed {
        operation: MutationKind,
        reason: String,
    },

    /// The initial collection fetch failed; prior state was kept.
    #[error("loading notifications failed: {0}")]
    FetchFailed(String),

    /// The session ended while the request was in flight; the result was discarded.
    #[error("session ended before the result arrived")]
    SessionEnded,
}

impl NotificationError {
    pub fn mutation_failed(operation: MutationKind, reason: impl Into<String>) -> Self {
        NotificationError::MutationFailed {
            operation,
            reason: reason.into(),
        }
    }

    /// Returns true if the error should send the user back to login.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, NotificationError::AuthExpired)
    }
}
