//! EventDispatcher - routes push events into the notification store.
//!
//! Stateless: every event is applied to the store synchronously, in the
//! order the connection task hands them over.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::notification::PushEvent;
use crate::ports::PushEventHandler;

use super::store::NotificationStore;

pub struct EventDispatcher {
    store: Arc<NotificationStore>,
}

impl EventDispatcher {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }
}

impl PushEventHandler for EventDispatcher {
    fn handle(&self, event: PushEvent) {
        match event {
            PushEvent::Created(notification) => {
                let id = notification.id().clone();
                let outcome = self.store.apply_created(notification);
                debug!(notification_id = %id, ?outcome, "Applied pushed notification");
            }
            PushEvent::Read(id) => {
                let changed = self.store.apply_read(&id);
                debug!(notification_id = %id, changed, "Applied pushed read");
            }
            PushEvent::Deleted(id) => {
                let removed = self.store.apply_deleted(&id);
                debug!(notification_id = %id, removed, "Applied pushed delete");
            }
            PushEvent::Unknown { kind } => {
                warn!(kind = %kind, "Ignoring unknown push event");
            }
        }
    }

    fn name(&self) -> &'static str {
        "EventDispatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockNotificationApi;
    use crate::domain::foundation::Timestamp;
    use crate::domain::notification::Notification;

    fn dispatcher() -> (Arc<NotificationStore>, EventDispatcher) {
        let store = Arc::new(NotificationStore::new(Arc::new(MockNotificationApi::new())));
        (store.clone(), EventDispatcher::new(store))
    }

    fn created(id: i64) -> PushEvent {
        PushEvent::Created(Notification::new(id, "new plan", Timestamp::from_unix_secs(id)))
    }

    #[test]
    fn create_then_delete_leaves_nothing() {
        let (store, dispatcher) = dispatcher();

        dispatcher.handle(created(1));
        assert_eq!(store.unread_count(), 1);

        dispatcher.handle(PushEvent::Deleted(1.into()));
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn read_before_create_is_ignored() {
        let (store, dispatcher) = dispatcher();

        dispatcher.handle(PushEvent::Read(1.into()));
        dispatcher.handle(created(1));

        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn events_apply_in_delivery_order() {
        let (store, dispatcher) = dispatcher();

        dispatcher.handle(created(1));
        dispatcher.handle(created(2));
        dispatcher.handle(PushEvent::Read(1.into()));

        let snapshot = store.snapshot();
        let ids: Vec<String> = snapshot.notifications.iter().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(snapshot.unread_count, 1);
    }

    #[test]
    fn unknown_events_change_nothing() {
        let (store, dispatcher) = dispatcher();

        dispatcher.handle(PushEvent::Unknown {
            kind: "client:linked".into(),
        });

        assert!(store.is_empty());
    }
}
