//! Integration tests for notification reconciliation.
//!
//! These tests drive the store the way the running client does:
//! 1. REST results arrive through the mock backend
//! 2. Push events arrive through a scripted push connection
//! 3. The view models read the resulting snapshot
//!
//! Uses in-memory adapters, no network.

use std::sync::Arc;
use std::time::Duration;

use coach_realtime::adapters::http::{ApiCall, ApiCallKind, MockNotificationApi};
use coach_realtime::adapters::websocket::ScriptedTransport;
use coach_realtime::application::{
    ConnectionManager, ConnectionSettings, EventDispatcher, NotificationBadge, NotificationStore,
};
use coach_realtime::domain::connection::ConnectionState;
use coach_realtime::domain::foundation::{Credential, Timestamp};
use coach_realtime::domain::notification::{Notification, NotificationError, PushEvent};
use coach_realtime::ports::ApiError;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn notification(id: i64, read: bool) -> Notification {
    Notification::new(id, format!("notification {}", id), Timestamp::from_unix_secs(1_700_000_000 + id))
        .with_read(read)
}

fn ids(store: &NotificationStore) -> Vec<String> {
    store
        .snapshot()
        .notifications
        .iter()
        .map(|n| n.id().to_string())
        .collect()
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    true
}

struct PushedStore {
    store: Arc<NotificationStore>,
    api: Arc<MockNotificationApi>,
    transport: Arc<ScriptedTransport>,
    connections: ConnectionManager,
}

fn pushed_store(server: Vec<Notification>) -> PushedStore {
    let api = Arc::new(MockNotificationApi::with_notifications(server));
    let store = Arc::new(NotificationStore::new(api.clone()));
    let transport = Arc::new(ScriptedTransport::new());
    let connections = ConnectionManager::new(
        transport.clone(),
        Arc::new(EventDispatcher::new(store.clone())),
        ConnectionSettings::default(),
    );
    PushedStore {
        store,
        api,
        transport,
        connections,
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn initial_load_sets_list_and_unread_count() {
    let api = Arc::new(MockNotificationApi::with_notifications(vec![
        notification(1, false),
        notification(2, true),
    ]));
    let store = NotificationStore::new(api);

    assert_eq!(store.load_all().await.unwrap(), 2);

    assert_eq!(ids(&store), vec!["1", "2"]);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(
        NotificationBadge::from_snapshot(&store.snapshot()).label.as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn push_then_delete_empties_the_list() {
    let h = pushed_store(vec![notification(1, false)]);
    h.store.load_all().await.unwrap();
    assert_eq!(h.store.unread_count(), 1);

    h.connections.open(Credential::new("token")).await;
    let peer = h.transport.wait_for_peer(1).await.unwrap();
    assert!(peer.send_event(PushEvent::Deleted(1.into())));

    assert!(eventually(|| h.store.is_empty()).await);
    assert_eq!(h.store.unread_count(), 0);
    h.connections.close().await;
}

#[tokio::test]
async fn pushed_events_merge_with_loaded_state() {
    let h = pushed_store(vec![notification(1, true)]);
    h.store.load_all().await.unwrap();
    let mut alerts = h.store.alerts();

    h.connections.open(Credential::new("token")).await;
    let peer = h.transport.wait_for_peer(1).await.unwrap();
    peer.send_event(PushEvent::Created(notification(2, false)));
    peer.send_event(PushEvent::Created(notification(2, false)));
    peer.send_event(PushEvent::Created(notification(3, false)));
    peer.send_event(PushEvent::Read(3.into()));

    assert!(eventually(|| h.store.len() == 3 && h.store.unread_count() == 1).await);
    assert_eq!(ids(&h.store), vec!["3", "2", "1"]);
    assert!(h.store.is_consistent());

    let first = alerts.recv().await.unwrap();
    let second = alerts.recv().await.unwrap();
    assert_eq!(first.id().to_string(), "2");
    assert_eq!(second.id().to_string(), "3");
    h.connections.close().await;
}

#[tokio::test]
async fn read_before_create_ends_unread() {
    let h = pushed_store(vec![]);
    h.connections.open(Credential::new("token")).await;
    let peer = h.transport.wait_for_peer(1).await.unwrap();

    peer.send_event(PushEvent::Read(1.into()));
    peer.send_event(PushEvent::Created(notification(1, false)));

    assert!(eventually(|| h.store.len() == 1).await);
    assert_eq!(h.store.unread_count(), 1);
    h.connections.close().await;
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn failed_mark_read_leaves_state_unchanged() {
    let h = pushed_store(vec![notification(5, false), notification(4, false)]);
    h.store.load_all().await.unwrap();
    let before = h.store.snapshot();

    h.api
        .fail_next(ApiCallKind::MarkRead, ApiError::status(500, "internal error"));
    let err = h.store.mark_read(Some(&5.into())).await.unwrap_err();

    assert!(matches!(err, NotificationError::MutationFailed { .. }));
    assert_eq!(h.store.snapshot(), before);
}

#[tokio::test]
async fn mark_all_read_is_one_request() {
    let h = pushed_store(vec![
        notification(3, false),
        notification(2, true),
        notification(1, false),
    ]);
    h.store.load_all().await.unwrap();

    h.store.mark_read(None).await.unwrap();

    let snapshot = h.store.snapshot();
    assert!(snapshot.notifications.iter().all(|n| n.is_read()));
    assert_eq!(snapshot.unread_count, 0);
    assert_eq!(h.api.calls(), vec![ApiCall::List, ApiCall::MarkAllRead]);
}

#[tokio::test]
async fn failed_rollback_does_not_resurrect_pushed_delete() {
    let h = pushed_store(vec![notification(5, false)]);
    h.store.load_all().await.unwrap();

    h.api
        .fail_next(ApiCallKind::MarkRead, ApiError::status(502, "bad gateway"));
    let hold = h.api.hold_next(ApiCallKind::MarkRead);

    let store = h.store.clone();
    let pending = tokio::spawn(async move { store.mark_read(Some(&5.into())).await });
    h.api.wait_for_calls(ApiCallKind::MarkRead, 1).await;

    h.store.apply_deleted(&5.into());
    hold.release();

    assert!(pending.await.unwrap().is_err());
    assert!(h.store.is_empty());
    assert_eq!(h.store.unread_count(), 0);
}

#[tokio::test]
async fn delete_all_keeps_notifications_pushed_meanwhile() {
    let h = pushed_store(vec![notification(2, false), notification(1, false)]);
    h.store.load_all().await.unwrap();

    let hold = h.api.hold_next(ApiCallKind::DeleteAll);
    let store = h.store.clone();
    let pending = tokio::spawn(async move { store.delete_all().await });
    h.api.wait_for_calls(ApiCallKind::DeleteAll, 1).await;

    h.store.apply_created(notification(3, false));
    hold.release();

    pending.await.unwrap().unwrap();
    assert_eq!(ids(&h.store), vec!["3"]);
    assert_eq!(h.store.unread_count(), 1);
}

#[tokio::test]
async fn results_after_reset_are_discarded() {
    let h = pushed_store(vec![notification(1, false)]);
    h.store.load_all().await.unwrap();

    h.api
        .fail_next(ApiCallKind::Delete, ApiError::status(500, "internal error"));
    let hold = h.api.hold_next(ApiCallKind::Delete);
    let store = h.store.clone();
    let pending = tokio::spawn(async move { store.delete(&1.into()).await });
    h.api.wait_for_calls(ApiCallKind::Delete, 1).await;

    h.store.reset();
    hold.release();

    assert_eq!(pending.await.unwrap(), Err(NotificationError::SessionEnded));
    assert!(h.store.is_empty());
}

// =============================================================================
// Connection lifecycle
// =============================================================================

#[tokio::test]
async fn opening_twice_keeps_one_connection() {
    let h = pushed_store(vec![]);
    let credential = Credential::new("token");

    let first = h.connections.open(credential.clone()).await;
    assert!(eventually(|| h.connections.state() == ConnectionState::Connected).await);
    let second = h.connections.open(credential).await;

    assert_eq!(first, second);
    assert_eq!(h.transport.connect_count(), 1);
    h.connections.close().await;
}

#[tokio::test]
async fn reconnect_attempts_are_bounded() {
    let api = Arc::new(MockNotificationApi::new());
    let store = Arc::new(NotificationStore::new(api));
    let transport = Arc::new(ScriptedTransport::new());
    transport.refuse_times(100, coach_realtime::ports::TransportError::connect("refused"));
    let connections = ConnectionManager::new(
        transport.clone(),
        Arc::new(EventDispatcher::new(store)),
        ConnectionSettings {
            reconnect: coach_realtime::domain::connection::ReconnectPolicy::new(
                Duration::from_millis(5),
                Duration::from_millis(20),
                3,
            ),
            ..ConnectionSettings::default()
        },
    );

    connections.open(Credential::new("token")).await;

    assert!(eventually(|| connections.state() == ConnectionState::Error).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.connect_count(), 4);
    assert!(matches!(
        connections.last_error(),
        Some(NotificationError::Connection(_))
    ));
}
