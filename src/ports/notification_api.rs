//! NotificationApi port - REST access to the notification collection.
//!
//! The store never talks HTTP directly; it goes through this port so that
//! tests can drive it with an in-memory double and the binary can plug in
//! the reqwest client.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::NotificationId;
use crate::domain::notification::Notification;

/// Port for the notification REST endpoints.
///
/// Every call carries the current bearer credential. Implementations map
/// 401/403 to `ApiError::Unauthorized` so the store can classify it as an
/// expired session.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications`, newest first.
    async fn list(&self) -> Result<Vec<Notification>, ApiError>;

    /// `PUT /notifications/{id}/read`
    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError>;

    /// `PUT /notifications/read-all`
    async fn mark_all_read(&self) -> Result<(), ApiError>;

    /// `DELETE /notifications/{id}`
    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError>;

    /// `DELETE /notifications`
    async fn delete_all(&self) -> Result<(), ApiError>;
}

/// Errors from the REST adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The credential was refused (401 or 403).
    #[error("unauthorized (status {status})")]
    Unauthorized { status: u16 },

    /// Any other non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The request did not complete in time.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// No credential is available for the call.
    #[error("no credential available")]
    MissingCredential,
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns true if the session should be treated as expired.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn NotificationApi) {}

    #[test]
    fn unauthorized_and_missing_credential_are_auth_errors() {
        assert!(ApiError::Unauthorized { status: 401 }.is_auth());
        assert!(ApiError::MissingCredential.is_auth());
        assert!(!ApiError::status(500, "boom").is_auth());
        assert!(!ApiError::Timeout { timeout_secs: 5 }.is_auth());
    }

    #[test]
    fn status_error_displays_code_and_message() {
        let err = ApiError::status(503, "maintenance");
        assert_eq!(err.to_string(), "server returned 503: maintenance");
    }
}
