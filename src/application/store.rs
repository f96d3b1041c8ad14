//! NotificationStore - the single source of truth for notifications.
//!
//! Wraps a `NotificationLedger` behind a lock and connects it to the REST
//! port, the auth collaborator and the presentation layer:
//!
//! - push events arrive through `apply_*` (synchronous, never fail)
//! - user commands go through `mark_read`, `delete` and `delete_all`
//!   (optimistic where possible, rolled back on failure)
//! - views read `snapshot()` or follow `subscribe()`; new unread
//!   notifications are announced on `alerts()`
//!
//! ## Session epoch
//!
//! `reset()` bumps an epoch counter. Every REST call remembers the epoch it
//! started under and its result is only applied if the epoch is unchanged,
//! so a response that lands after logout never touches the next session.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::domain::connection::ConnectionState;
use crate::domain::foundation::NotificationId;
use crate::domain::notification::{
    CreateOutcome, MutationKind, Notification, NotificationError, NotificationLedger, ReadChange,
};
use crate::ports::{ApiError, AuthSession, NotificationApi};

/// Default capacity of the new-notification alert channel.
pub const DEFAULT_ALERT_CAPACITY: usize = 32;

/// Immutable view of the store handed to presentation adapters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationSnapshot {
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    /// True while a full load is in flight.
    pub loading: bool,
    pub connection_state: ConnectionState,
}

struct StoreInner {
    ledger: NotificationLedger,
    epoch: u64,
    loads_in_flight: u32,
    connection_state: ConnectionState,
}

/// Reconciles push events and command results into one notification list.
pub struct NotificationStore {
    api: Arc<dyn NotificationApi>,
    auth: Option<Arc<dyn AuthSession>>,
    inner: Mutex<StoreInner>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
    alerts_tx: broadcast::Sender<Notification>,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self::with_alert_capacity(api, DEFAULT_ALERT_CAPACITY)
    }

    pub fn with_alert_capacity(api: Arc<dyn NotificationApi>, alert_capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(NotificationSnapshot::default());
        let (alerts_tx, _) = broadcast::channel(alert_capacity.max(1));
        Self {
            api,
            auth: None,
            inner: Mutex::new(StoreInner {
                ledger: NotificationLedger::new(),
                epoch: 0,
                loads_in_flight: 0,
                connection_state: ConnectionState::Disconnected,
            }),
            snapshot_tx,
            alerts_tx,
        }
    }

    /// Routes 401/403 responses to the auth collaborator.
    pub fn with_auth_session(mut self, auth: Arc<dyn AuthSession>) -> Self {
        self.auth = Some(auth);
        self
    }

    // === Views ===

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Follows every state change.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Fire-and-forget alerts for genuinely new unread notifications.
    pub fn alerts(&self) -> broadcast::Receiver<Notification> {
        self.alerts_tx.subscribe()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().ledger.unread_count()
    }

    pub fn len(&self) -> usize {
        self.lock().ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().ledger.is_empty()
    }

    /// True when the unread count agrees with a full recount.
    pub fn is_consistent(&self) -> bool {
        self.lock().ledger.is_consistent()
    }

    // === Session lifecycle ===

    /// Fetches the whole collection and replaces local state with it.
    ///
    /// On failure the previous state is kept.
    pub async fn load_all(&self) -> Result<usize, NotificationError> {
        let epoch = {
            let mut inner = self.lock();
            inner.loads_in_flight += 1;
            self.publish(&inner);
            inner.epoch
        };

        let result = self.api.list().await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!(epoch, "Discarding notification list from an ended session");
            return Err(NotificationError::SessionEnded);
        }
        inner.loads_in_flight = inner.loads_in_flight.saturating_sub(1);

        match result {
            Ok(notifications) => {
                let count = inner.ledger.replace_all(notifications);
                self.publish(&inner);
                info!(
                    count,
                    unread = inner.ledger.unread_count(),
                    "Loaded notifications"
                );
                Ok(count)
            }
            Err(e) => {
                self.publish(&inner);
                drop(inner);
                warn!(error = %e, "Loading notifications failed");
                Err(self.classify(e, NotificationError::FetchFailed))
            }
        }
    }

    /// Drops all state and invalidates in-flight requests.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.loads_in_flight = 0;
        inner.ledger.clear();
        self.publish(&inner);
        debug!(epoch = inner.epoch, "Notification store reset");
    }

    /// Mirrors the push connection state into snapshots.
    pub fn set_connection_state(&self, state: ConnectionState) {
        let mut inner = self.lock();
        if inner.connection_state != state {
            inner.connection_state = state;
            self.publish(&inner);
        }
    }

    // === Push events ===

    /// Applies a pushed notification. Duplicate delivery is harmless.
    pub fn apply_created(&self, notification: Notification) -> CreateOutcome {
        let alert = notification.is_unread().then(|| notification.clone());
        let outcome = {
            let mut inner = self.lock();
            let outcome = inner.ledger.apply_created(notification);
            self.publish(&inner);
            outcome
        };

        if outcome == CreateOutcome::Inserted {
            if let Some(alert) = alert {
                // No subscribers is fine.
                let _ = self.alerts_tx.send(alert);
            }
        }
        outcome
    }

    /// Applies a pushed read. Returns true if an entry flipped.
    pub fn apply_read(&self, id: &NotificationId) -> bool {
        let mut inner = self.lock();
        let changed = inner.ledger.apply_read(id);
        if changed {
            self.publish(&inner);
        }
        changed
    }

    /// Applies a pushed deletion. Returns true if an entry was removed.
    pub fn apply_deleted(&self, id: &NotificationId) -> bool {
        let mut inner = self.lock();
        let removed = inner.ledger.apply_deleted(id).is_some();
        if removed {
            self.publish(&inner);
        }
        removed
    }

    // === Commands ===

    /// Marks one notification read, or all of them with `None`.
    ///
    /// One id: no request is made when the entry is absent or already
    /// read. All: exactly one bulk request is always made. Either way the
    /// local flip happens first and is rolled back if the request fails.
    /// On success the affected ids are settled read again, since a reload
    /// may have replaced the local flip with an older server copy.
    pub async fn mark_read(&self, id: Option<&NotificationId>) -> Result<(), NotificationError> {
        match id {
            Some(id) => {
                let (change, epoch) = {
                    let mut inner = self.lock();
                    let Some(change) = inner.ledger.mark_read_optimistic(id) else {
                        debug!(notification_id = %id, "Nothing to mark read");
                        return Ok(());
                    };
                    self.publish(&inner);
                    (change, inner.epoch)
                };
                let result = self.api.mark_read(id).await;
                let confirmed = vec![id.clone()];
                self.settle_reads(epoch, confirmed, vec![change], result, MutationKind::MarkRead)
            }
            None => {
                let (confirmed, changes, epoch) = {
                    let mut inner = self.lock();
                    let present = inner.ledger.ids();
                    let changes = inner.ledger.mark_all_read_optimistic();
                    if !changes.is_empty() {
                        self.publish(&inner);
                    }
                    (present, changes, inner.epoch)
                };
                let result = self.api.mark_all_read().await;
                self.settle_reads(epoch, confirmed, changes, result, MutationKind::MarkAllRead)
            }
        }
    }

    /// Deletes one notification, restoring it in place if the request fails.
    pub async fn delete(&self, id: &NotificationId) -> Result<(), NotificationError> {
        let (removal, epoch) = {
            let mut inner = self.lock();
            let Some(removal) = inner.ledger.remove_optimistic(id) else {
                debug!(notification_id = %id, "Nothing to delete");
                return Ok(());
            };
            self.publish(&inner);
            (removal, inner.epoch)
        };

        let result = self.api.delete(id).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Self::stale_result(result, MutationKind::Delete);
        }
        match result {
            Ok(()) => {
                inner.ledger.confirm_removed(id);
                self.publish(&inner);
                Ok(())
            }
            Err(e) => {
                let restored = inner.ledger.restore_removed(removal);
                self.publish(&inner);
                drop(inner);
                warn!(notification_id = %id, restored, error = %e, "Delete failed");
                Err(self.classify(e, |reason| {
                    NotificationError::mutation_failed(MutationKind::Delete, reason)
                }))
            }
        }
    }

    /// Deletes every notification.
    ///
    /// Local state is only cleared once the server confirms, and only the
    /// ids present when the request was issued go. Entries pushed while the
    /// request was in flight are kept.
    pub async fn delete_all(&self) -> Result<(), NotificationError> {
        let (requested, epoch) = {
            let inner = self.lock();
            (inner.ledger.ids(), inner.epoch)
        };

        let result = self.api.delete_all().await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Self::stale_result(result, MutationKind::DeleteAll);
        }
        match result {
            Ok(()) => {
                let removed = inner.ledger.remove_all_of(&requested);
                self.publish(&inner);
                info!(removed, "Deleted all notifications");
                Ok(())
            }
            Err(e) => {
                drop(inner);
                warn!(error = %e, "Delete all failed");
                Err(self.classify(e, |reason| {
                    NotificationError::mutation_failed(MutationKind::DeleteAll, reason)
                }))
            }
        }
    }

    // === Internals ===

    fn settle_reads(
        &self,
        epoch: u64,
        confirmed: Vec<NotificationId>,
        changes: Vec<ReadChange>,
        result: Result<(), ApiError>,
        operation: MutationKind,
    ) -> Result<(), NotificationError> {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Self::stale_result(result, operation);
        }
        match result {
            Ok(()) => {
                if inner.ledger.confirm_reads(&confirmed) > 0 {
                    self.publish(&inner);
                }
                Ok(())
            }
            Err(e) => {
                let reverted = inner.ledger.revert_reads(&changes);
                if reverted > 0 {
                    self.publish(&inner);
                }
                drop(inner);
                warn!(
                    operation = %operation,
                    flipped = changes.len(),
                    reverted,
                    error = %e,
                    "Mark read failed, rolled back"
                );
                Err(self.classify(e, |reason| NotificationError::mutation_failed(operation, reason)))
            }
        }
    }

    /// Outcome of a request that finished after `reset()`: nothing is applied.
    fn stale_result(result: Result<(), ApiError>, operation: MutationKind) -> Result<(), NotificationError> {
        debug!(operation = %operation, ok = result.is_ok(), "Ignoring result from an ended session");
        match result {
            Ok(()) => Ok(()),
            Err(_) => Err(NotificationError::SessionEnded),
        }
    }

    fn classify(
        &self,
        error: ApiError,
        otherwise: impl FnOnce(String) -> NotificationError,
    ) -> NotificationError {
        if !error.is_auth() {
            return otherwise(error.to_string());
        }
        if let Some(auth) = &self.auth {
            if let Some(credential) = auth.current_credential() {
                auth.credential_rejected(&credential);
            }
        }
        NotificationError::AuthExpired
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic while holding the lock leaves the ledger intact; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, inner: &StoreInner) {
        self.snapshot_tx.send_replace(NotificationSnapshot {
            notifications: inner.ledger.to_vec(),
            unread_count: inner.ledger.unread_count(),
            loading: inner.loads_in_flight > 0,
            connection_state: inner.connection_state,
        });
    }
}
