//! Server-originated push events.

use crate::domain::foundation::NotificationId;

use super::Notification;

/// An event delivered over the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A new notification for the current user.
    Created(Notification),

    /// A notification was marked read (possibly from another tab or device).
    Read(NotificationId),

    /// A notification was deleted.
    Deleted(NotificationId),

    /// An event kind this client does not understand.
    Unknown { kind: String },
}

impl PushEvent {
    /// Symbolic name used in logs.
    pub fn kind(&self) -> &str {
        match self {
            PushEvent::Created(_) => "NOTIFICATION_CREATED",
            PushEvent::Read(_) => "NOTIFICATION_READ",
            PushEvent::Deleted(_) => "NOTIFICATION_DELETED",
            PushEvent::Unknown { kind } => kind,
        }
    }
}
