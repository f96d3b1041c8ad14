//! The Notification entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{NotificationId, Timestamp};

/// One user-facing alert generated by the server.
///
/// Everything except the read flag is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    message: String,
    #[serde(default)]
    read: bool,
    created_at: Timestamp,
}

impl Notification {
    /// Creates an unread notification.
    pub fn new(id: impl Into<NotificationId>, message: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            read: false,
            created_at,
        }
    }

    /// Returns the same notification with the given read flag.
    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn is_unread(&self) -> bool {
        !self.read
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub(crate) fn set_read(&mut self, read: bool) {
        self.read = read;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_backend_shape() {
        let value = json!({
            "id": 12,
            "message": "Marco completed Leg Day",
            "read": false,
            "createdAt": "2024-03-02T08:15:00Z"
        });

        let notification: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(notification.id(), &NotificationId::from(12));
        assert_eq!(notification.message(), "Marco completed Leg Day");
        assert!(notification.is_unread());
    }

    #[test]
    fn missing_read_flag_defaults_to_unread() {
        let value = json!({
            "id": "n-1",
            "message": "New client linked",
            "createdAt": "2024-03-02T08:15:00Z"
        });

        let notification: Notification = serde_json::from_value(value).unwrap();
        assert!(notification.is_unread());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let notification = Notification::new(1, "hello", Timestamp::from_unix_secs(0));
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains(r#""createdAt""#));
        assert!(json.contains(r#""read":false"#));
    }

    #[test]
    fn with_read_sets_flag() {
        let notification = Notification::new(1, "hello", Timestamp::now()).with_read(true);
        assert!(notification.is_read());
    }
}
