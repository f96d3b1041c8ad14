//! Mock NotificationApi for testing.
//!
//! Behaves like a tiny in-memory notification backend so stores can be
//! exercised without HTTP.
//!
//! # Features
//!
//! - Server-side collection that successful mutations update
//! - Error injection per call kind
//! - Holds that park a call until the test releases it, for ordering tests
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let api = MockNotificationApi::with_notifications(vec![n1, n2]);
//! api.fail_next(ApiCallKind::MarkRead, ApiError::status(500, "boom"));
//!
//! let store = NotificationStore::new(Arc::new(api));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::domain::foundation::NotificationId;
use crate::domain::notification::Notification;
use crate::ports::{ApiError, NotificationApi};

/// Which endpoint a call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCallKind {
    List,
    MarkRead,
    MarkAllRead,
    Delete,
    DeleteAll,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List,
    MarkRead(NotificationId),
    MarkAllRead,
    Delete(NotificationId),
    DeleteAll,
}

impl ApiCall {
    pub fn kind(&self) -> ApiCallKind {
        match self {
            ApiCall::List => ApiCallKind::List,
            ApiCall::MarkRead(_) => ApiCallKind::MarkRead,
            ApiCall::MarkAllRead => ApiCallKind::MarkAllRead,
            ApiCall::Delete(_) => ApiCallKind::Delete,
            ApiCall::DeleteAll => ApiCallKind::DeleteAll,
        }
    }
}

/// Releases a call parked by `MockNotificationApi::hold_next`.
///
/// Dropping the hold releases the call too.
#[derive(Debug)]
pub struct ApiHold(oneshot::Sender<()>);

impl ApiHold {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Default)]
struct MockState {
    notifications: Vec<Notification>,
    failures: HashMap<ApiCallKind, VecDeque<ApiError>>,
    holds: HashMap<ApiCallKind, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<ApiCall>,
}

/// In-memory notification backend.
#[derive(Default)]
pub struct MockNotificationApi {
    state: Mutex<MockState>,
}

impl MockNotificationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `notifications` (newest first).
    pub fn with_notifications(notifications: Vec<Notification>) -> Self {
        let api = Self::new();
        api.state().notifications = notifications;
        api
    }

    /// Replaces the server-side collection.
    pub fn set_notifications(&self, notifications: Vec<Notification>) {
        self.state().notifications = notifications;
    }

    /// Adds a notification on the server side, newest first.
    pub fn push_notification(&self, notification: Notification) {
        self.state().notifications.insert(0, notification);
    }

    /// Server-side collection as it stands.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    /// Makes the next call of `kind` fail with `error`.
    pub fn fail_next(&self, kind: ApiCallKind, error: ApiError) {
        self.state().failures.entry(kind).or_default().push_back(error);
    }

    /// Parks the next call of `kind` until the returned hold is released.
    pub fn hold_next(&self, kind: ApiCallKind) -> ApiHold {
        let (tx, rx) = oneshot::channel();
        self.state().holds.entry(kind).or_default().push_back(rx);
        ApiHold(tx)
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, kind: ApiCallKind) -> usize {
        self.state().calls.iter().filter(|c| c.kind() == kind).count()
    }

    /// Waits until at least `count` calls of `kind` have started.
    ///
    /// Gives up after two seconds so a broken test fails instead of hanging.
    pub async fn wait_for_calls(&self, kind: ApiCallKind, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.call_count(kind) < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the call, then waits on any hold, then yields the injected failure.
    async fn begin(&self, call: ApiCall) -> Result<(), ApiError> {
        let kind = call.kind();
        let (hold, failure) = {
            let mut state = self.state();
            state.calls.push(call);
            let hold = state.holds.get_mut(&kind).and_then(VecDeque::pop_front);
            let failure = state.failures.get_mut(&kind).and_then(VecDeque::pop_front);
            (hold, failure)
        };

        if let Some(hold) = hold {
            // Released or dropped, either way proceed.
            let _ = hold.await;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NotificationApi for MockNotificationApi {
    async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.begin(ApiCall::List).await?;
        Ok(self.state().notifications.clone())
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.begin(ApiCall::MarkRead(id.clone())).await?;
        let mut state = self.state();
        match state.notifications.iter_mut().find(|n| n.id() == id) {
            Some(n) => {
                n.set_read(true);
                Ok(())
            }
            None => Err(ApiError::status(404, "notification not found")),
        }
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.begin(ApiCall::MarkAllRead).await?;
        for n in self.state().notifications.iter_mut() {
            n.set_read(true);
        }
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.begin(ApiCall::Delete(id.clone())).await?;
        let mut state = self.state();
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id() != id);
        if state.notifications.len() == before {
            return Err(ApiError::status(404, "notification not found"));
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), ApiError> {
        self.begin(ApiCall::DeleteAll).await?;
        self.state().notifications.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn notification(id: i64) -> Notification {
        Notification::new(id, "hello", Timestamp::from_unix_secs(id))
    }

    #[tokio::test]
    async fn list_returns_seeded_notifications() {
        let api = MockNotificationApi::with_notifications(vec![notification(1), notification(2)]);

        let list = api.list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(api.calls(), vec![ApiCall::List]);
    }

    #[tokio::test]
    async fn injected_failure_is_used_once() {
        let api = MockNotificationApi::new();
        api.fail_next(ApiCallKind::DeleteAll, ApiError::network("reset"));

        assert!(api.delete_all().await.is_err());
        assert!(api.delete_all().await.is_ok());
        assert_eq!(api.call_count(ApiCallKind::DeleteAll), 2);
    }

    #[tokio::test]
    async fn successful_mutations_update_server_side_state() {
        let api = MockNotificationApi::with_notifications(vec![notification(1), notification(2)]);

        api.mark_read(&1.into()).await.unwrap();
        api.delete(&2.into()).await.unwrap();

        let remaining = api.notifications();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_read());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let api = MockNotificationApi::new();
        let err = api.delete(&"missing".into()).await.unwrap_err();
        assert_eq!(err, ApiError::status(404, "notification not found"));
    }

    #[tokio::test]
    async fn held_call_waits_for_release() {
        let api = std::sync::Arc::new(MockNotificationApi::new());
        let hold = api.hold_next(ApiCallKind::MarkAllRead);

        let task = tokio::spawn({
            let api = api.clone();
            async move { api.mark_all_read().await }
        });
        api.wait_for_calls(ApiCallKind::MarkAllRead, 1).await;
        assert!(!task.is_finished());

        hold.release();
        assert!(task.await.unwrap().is_ok());
    }
}
