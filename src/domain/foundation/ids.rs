//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Server-assigned identifier of a notification.
///
/// The backend emits ids either as JSON numbers or as strings. Both forms
/// are kept as received so they serialize back unchanged, but equality and
/// hashing go through the canonical string form: `5` and `"5"` name the
/// same notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    Numeric(i64),
    Text(String),
}

impl NotificationId {
    /// Canonical string form used for comparison and URL paths.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            NotificationId::Numeric(n) => Cow::Owned(n.to_string()),
            NotificationId::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for NotificationId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NotificationId::Numeric(a), NotificationId::Numeric(b)) => a == b,
            _ => self.as_key() == other.as_key(),
        }
    }
}

impl Eq for NotificationId {}

impl Hash for NotificationId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key().hash(state);
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

impl FromStr for NotificationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("notification_id"));
        }
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => NotificationId::Numeric(n),
            Err(_) => NotificationId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for NotificationId {
    fn from(n: i64) -> Self {
        NotificationId::Numeric(n)
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        NotificationId::Text(s.to_string())
    }
}

/// Identifies one connection session (one `open` of the push channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSessionId(Uuid);

impl ConnectionSessionId {
    /// Creates a new random ConnectionSessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user a pushed notification is addressed to (server side).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    /// Creates a recipient id, rejecting blank values.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("recipient_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
