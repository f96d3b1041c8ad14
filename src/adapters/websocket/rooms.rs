//! Push hub: per-recipient rooms for server-side fan-out.
//!
//! Every connected socket joins the room of the recipient its token
//! resolved to. Publishing to a recipient reaches all of their open
//! connections (several tabs or devices) and nobody else.
//!
//! ```text
//! Room: coach-7        Room: client-19
//! ├── client-a         └── client-d
//! └── client-b
//! ```

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::RecipientId;
use crate::domain::notification::PushEvent;

/// Identifies one socket connection on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room registry keyed by recipient.
///
/// Publishes (reads) vastly outnumber joins and leaves (writes), hence the
/// `RwLock`.
pub struct PushHub {
    rooms: RwLock<HashMap<RecipientId, broadcast::Sender<PushEvent>>>,
    client_rooms: RwLock<HashMap<ClientId, RecipientId>>,
    channel_capacity: usize,
}

impl PushHub {
    /// `channel_capacity` bounds how far a slow socket may lag before it
    /// starts missing events.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_rooms: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Joins `client_id` to the recipient's room, creating it if needed.
    pub async fn join(&self, recipient: &RecipientId, client_id: ClientId) -> broadcast::Receiver<PushEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms.entry(recipient.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        self.client_rooms
            .write()
            .await
            .insert(client_id, recipient.clone());

        sender.subscribe()
    }

    /// Drops a client's membership and prunes the room once empty.
    ///
    /// The client's receiver must already be dropped for the room to be
    /// recognised as empty.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(recipient) = self.client_rooms.write().await.remove(client_id) else {
            return;
        };

        let mut rooms = self.rooms.write().await;
        if rooms
            .get(&recipient)
            .map(|sender| sender.receiver_count() == 0)
            .unwrap_or(false)
        {
            rooms.remove(&recipient);
        }
    }

    /// Sends `event` to every connection of `recipient`.
    ///
    /// Returns how many connections it reached; zero if none are open.
    pub async fn publish(&self, recipient: &RecipientId, event: PushEvent) -> usize {
        self.rooms
            .read()
            .await
            .get(recipient)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0)
    }

    /// Open connections of one recipient.
    pub async fn client_count(&self, recipient: &RecipientId) -> usize {
        self.rooms
            .read()
            .await
            .get(recipient)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    pub async fn active_rooms(&self) -> Vec<RecipientId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    pub async fn total_client_count(&self) -> usize {
        self.client_rooms.read().await.len()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new(128)
    }
}
