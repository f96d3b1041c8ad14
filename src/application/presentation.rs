//! Presentation adapters - view models and user actions over the store.
//!
//! Three surfaces read the same store:
//! - `NotificationBadge`: unread counter on the bell icon
//! - `NotificationPopover`: the newest few entries, marks all read on open
//! - `NotificationList`: the full page with per-item and bulk actions
//!
//! View models are plain serializable values rebuilt from a snapshot; the
//! store stays the only owner of notification state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::domain::connection::ConnectionState;
use crate::domain::foundation::{NotificationId, Timestamp};
use crate::domain::notification::{Notification, NotificationError};

use super::store::{NotificationSnapshot, NotificationStore};

/// How many entries the popover shows.
pub const PREVIEW_LIMIT: usize = 5;

/// Largest count the badge shows before collapsing to "9+".
const BADGE_MAX: usize = 9;

/// Text of the unread badge, or `None` when it should be hidden.
pub fn badge_label(unread_count: usize) -> Option<String> {
    match unread_count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{}+", BADGE_MAX)),
        n => Some(n.to_string()),
    }
}

/// Human form of a notification's age.
///
/// Under an hour: "just now". Under a day: whole hours. Older: `dd/mm/yyyy`.
/// Timestamps in the future count as "just now".
pub fn relative_time(created_at: &Timestamp, now: &Timestamp) -> String {
    let hours = now.duration_since(created_at).num_hours();
    if hours < 1 {
        "just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        created_at.as_datetime().format("%d/%m/%Y").to_string()
    }
}

/// Bell icon state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBadge {
    pub label: Option<String>,
    pub unread_count: usize,
    pub connection_state: ConnectionState,
}

impl NotificationBadge {
    pub fn from_snapshot(snapshot: &NotificationSnapshot) -> Self {
        Self {
            label: badge_label(snapshot.unread_count),
            unread_count: snapshot.unread_count,
            connection_state: snapshot.connection_state,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.label.is_some()
    }
}

/// One rendered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRow {
    pub id: NotificationId,
    pub message: String,
    pub read: bool,
    pub created_at: Timestamp,
    /// Relative age, see [`relative_time`].
    pub age: String,
}

impl NotificationRow {
    pub fn new(notification: &Notification, now: &Timestamp) -> Self {
        Self {
            id: notification.id().clone(),
            message: notification.message().to_string(),
            read: notification.is_read(),
            created_at: *notification.created_at(),
            age: relative_time(notification.created_at(), now),
        }
    }
}

fn rows<'a>(notifications: impl Iterator<Item = &'a Notification>, now: &Timestamp) -> Vec<NotificationRow> {
    notifications.map(|n| NotificationRow::new(n, now)).collect()
}

/// Dropdown under the bell icon.
///
/// Opening it marks everything read. Selecting an entry marks it read if
/// needed and closes the popover.
pub struct NotificationPopover {
    store: Arc<NotificationStore>,
    open: AtomicBool,
}

impl NotificationPopover {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self {
            store,
            open: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Opens the popover. Only the closed → open edge issues the bulk
    /// mark-read.
    pub async fn open(&self) -> Result<(), NotificationError> {
        if self.open.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.mark_read(None).await
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Newest entries, at most [`PREVIEW_LIMIT`].
    pub fn preview(&self, now: &Timestamp) -> Vec<NotificationRow> {
        let snapshot = self.store.snapshot();
        rows(snapshot.notifications.iter().take(PREVIEW_LIMIT), now)
    }

    /// Handles a click on an entry. The popover closes even if marking
    /// read fails.
    pub async fn select(&self, id: &NotificationId) -> Result<(), NotificationError> {
        let unread = self
            .store
            .snapshot()
            .notifications
            .iter()
            .any(|n| n.id() == id && n.is_unread());

        let result = if unread {
            self.store.mark_read(Some(id)).await
        } else {
            Ok(())
        };
        self.close();
        result
    }
}

/// The full notifications page.
pub struct NotificationList {
    store: Arc<NotificationStore>,
}

impl NotificationList {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }

    pub fn rows(&self, now: &Timestamp) -> Vec<NotificationRow> {
        rows(self.store.snapshot().notifications.iter(), now)
    }

    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    pub fn is_loading(&self) -> bool {
        self.store.snapshot().loading
    }

    /// Re-fetches the collection, e.g. after a failed initial load.
    pub async fn refresh(&self) -> Result<usize, NotificationError> {
        self.store.load_all().await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationError> {
        self.store.mark_read(Some(id)).await
    }

    pub async fn mark_all_read(&self) -> Result<(), NotificationError> {
        self.store.mark_read(None).await
    }

    pub async fn delete(&self, id: &NotificationId) -> Result<(), NotificationError> {
        self.store.delete(id).await
    }

    pub async fn delete_all(&self) -> Result<(), NotificationError> {
        self.store.delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{ApiCall, ApiCallKind, MockNotificationApi};
    use crate::ports::ApiError;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 15, hour, minute, 0).unwrap())
    }

    fn notification(id: i64, created_at: Timestamp) -> Notification {
        Notification::new(id, format!("message {}", id), created_at)
    }

    async fn loaded(notifications: Vec<Notification>) -> (Arc<MockNotificationApi>, Arc<NotificationStore>) {
        let api = Arc::new(MockNotificationApi::with_notifications(notifications));
        let store = Arc::new(NotificationStore::new(api.clone()));
        store.load_all().await.unwrap();
        (api, store)
    }

    // === Badge ===

    #[test]
    fn badge_hidden_at_zero() {
        assert_eq!(badge_label(0), None);
    }

    #[test]
    fn badge_shows_small_counts() {
        assert_eq!(badge_label(1).as_deref(), Some("1"));
        assert_eq!(badge_label(9).as_deref(), Some("9"));
    }

    #[test]
    fn badge_caps_above_nine() {
        assert_eq!(badge_label(10).as_deref(), Some("9+"));
        assert_eq!(badge_label(250).as_deref(), Some("9+"));
    }

    #[test]
    fn badge_from_snapshot() {
        let snapshot = NotificationSnapshot {
            unread_count: 12,
            ..Default::default()
        };
        let badge = NotificationBadge::from_snapshot(&snapshot);

        assert!(badge.is_visible());
        assert_eq!(badge.label.as_deref(), Some("9+"));
        assert_eq!(badge.connection_state, ConnectionState::Disconnected);
    }

    // === Relative time ===

    #[test]
    fn relative_time_under_an_hour_is_just_now() {
        assert_eq!(relative_time(&at(10, 0), &at(10, 59)), "just now");
    }

    #[test]
    fn relative_time_counts_whole_hours() {
        assert_eq!(relative_time(&at(7, 30), &at(10, 29)), "2h ago");
        assert_eq!(relative_time(&at(0, 0), &at(23, 59)), "23h ago");
    }

    #[test]
    fn relative_time_after_a_day_is_the_date() {
        let created = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap());
        assert_eq!(relative_time(&created, &at(10, 0)), "02/03/2024");
    }

    #[test]
    fn relative_time_in_the_future_is_just_now() {
        assert_eq!(relative_time(&at(12, 0), &at(10, 0)), "just now");
    }

    #[test]
    fn row_serializes_camel_case() {
        let row = NotificationRow::new(&notification(4, at(9, 0)), &at(10, 0));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["id"], 4);
        assert_eq!(json["read"], false);
        assert_eq!(json["age"], "1h ago");
        assert!(json.get("createdAt").is_some());
    }

    // === Popover ===

    #[tokio::test]
    async fn popover_previews_newest_five() {
        let items = (1..=7).rev().map(|id| notification(id, at(9, 0))).collect();
        let (_, store) = loaded(items).await;
        let popover = NotificationPopover::new(store);

        let preview = popover.preview(&at(10, 0));
        let ids: Vec<String> = preview.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["7", "6", "5", "4", "3"]);
    }

    #[tokio::test]
    async fn opening_marks_everything_read_once() {
        let (api, store) = loaded(vec![notification(2, at(9, 0)), notification(1, at(8, 0))]).await;
        let popover = NotificationPopover::new(store.clone());

        popover.open().await.unwrap();
        popover.open().await.unwrap();

        assert!(popover.is_open());
        assert_eq!(store.unread_count(), 0);
        assert_eq!(api.call_count(ApiCallKind::MarkAllRead), 1);
    }

    #[tokio::test]
    async fn reopening_marks_read_again() {
        let (api, store) = loaded(vec![notification(1, at(8, 0))]).await;
        let popover = NotificationPopover::new(store);

        popover.open().await.unwrap();
        popover.close();
        popover.open().await.unwrap();

        assert_eq!(api.call_count(ApiCallKind::MarkAllRead), 2);
    }

    #[tokio::test]
    async fn selecting_unread_entry_marks_it_and_closes() {
        let (api, store) = loaded(vec![notification(1, at(8, 0))]).await;
        let popover = NotificationPopover::new(store.clone());

        popover.select(&1.into()).await.unwrap();

        assert!(!popover.is_open());
        assert_eq!(store.unread_count(), 0);
        assert_eq!(api.calls(), vec![ApiCall::List, ApiCall::MarkRead(1.into())]);
    }

    #[tokio::test]
    async fn selecting_read_entry_only_closes() {
        let (api, store) = loaded(vec![notification(1, at(8, 0)).with_read(true)]).await;
        let popover = NotificationPopover::new(store);

        popover.select(&1.into()).await.unwrap();

        assert!(!popover.is_open());
        assert_eq!(api.call_count(ApiCallKind::MarkRead), 0);
    }

    #[tokio::test]
    async fn failed_open_rolls_back_but_stays_open() {
        let (api, store) = loaded(vec![notification(1, at(8, 0))]).await;
        api.fail_next(
            ApiCallKind::MarkAllRead,
            ApiError::status(500, "internal error"),
        );
        let popover = NotificationPopover::new(store.clone());

        let err = popover.open().await.unwrap_err();

        assert!(matches!(err, NotificationError::MutationFailed { .. }));
        assert!(popover.is_open());
        assert_eq!(store.unread_count(), 1);
    }

    // === List ===

    #[tokio::test]
    async fn list_actions_go_through_the_store() {
        let (api, store) = loaded(vec![
            notification(3, at(9, 30)),
            notification(2, at(9, 0)),
            notification(1, at(8, 0)),
        ])
        .await;
        let list = NotificationList::new(store);

        list.mark_read(&3.into()).await.unwrap();
        assert_eq!(list.unread_count(), 2);

        list.delete(&2.into()).await.unwrap();
        let ids: Vec<String> = list.rows(&at(10, 0)).iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["3", "1"]);

        list.mark_all_read().await.unwrap();
        assert_eq!(list.unread_count(), 0);

        list.delete_all().await.unwrap();
        assert!(list.rows(&at(10, 0)).is_empty());
        assert!(api.notifications().is_empty());
    }

    #[tokio::test]
    async fn list_rows_carry_relative_age() {
        let (_, store) = loaded(vec![notification(1, at(7, 0))]).await;
        let list = NotificationList::new(store);

        let rows = list.rows(&at(10, 0));
        assert_eq!(rows[0].age, "3h ago");
        assert!(!rows[0].read);
    }

    #[tokio::test]
    async fn refresh_picks_up_server_changes() {
        let (api, store) = loaded(vec![]).await;
        let list = NotificationList::new(store);

        api.push_notification(notification(5, at(9, 0)));
        assert_eq!(list.refresh().await.unwrap(), 1);
        assert_eq!(list.unread_count(), 1);
        assert!(!list.is_loading());
    }
}
