//! SessionSupervisor - ties the push session to the auth session.
//!
//! Follows the auth collaborator's session signal:
//! - credential appears: open the push connection, load the collection
//! - credential changes: reset the store, reopen, reload
//! - credential disappears: close the connection, reset the store
//!
//! It also mirrors the connection state into the store's snapshots.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::foundation::Credential;
use crate::ports::AuthSession;

use super::connection_manager::{wait_for_shutdown, ConnectionManager};
use super::store::NotificationStore;

pub struct SessionSupervisor {
    auth: Arc<dyn AuthSession>,
    connections: Arc<ConnectionManager>,
    store: Arc<NotificationStore>,
}

impl SessionSupervisor {
    pub fn new(
        auth: Arc<dyn AuthSession>,
        connections: Arc<ConnectionManager>,
        store: Arc<NotificationStore>,
    ) -> Self {
        Self {
            auth,
            connections,
            store,
        }
    }

    /// Runs until shutdown is signalled or the auth session source goes away.
    ///
    /// The push connection is closed on exit.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut session = self.auth.watch_session();
        let mut connection_state = self.connections.watch_state();
        let mut current: Option<Credential> = None;

        let initial = session.borrow_and_update().clone();
        self.apply(&mut current, initial).await;
        let state = *connection_state.borrow_and_update();
        self.store.set_connection_state(state);

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => {
                    debug!("Session supervisor shutting down");
                    break;
                }
                changed = session.changed() => {
                    if changed.is_err() {
                        info!("Auth session source closed");
                        break;
                    }
                    let next = session.borrow_and_update().clone();
                    self.apply(&mut current, next).await;
                }
                changed = connection_state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *connection_state.borrow_and_update();
                    self.store.set_connection_state(state);
                }
            }
        }

        self.connections.close().await;
        self.store.set_connection_state(self.connections.state());
    }

    async fn apply(&self, current: &mut Option<Credential>, next: Option<Credential>) {
        match next {
            Some(credential) => {
                if current.as_ref() == Some(&credential) && self.connections.state().is_active() {
                    return;
                }
                if current.as_ref().is_some_and(|c| c != &credential) {
                    info!("Identity changed, discarding previous notifications");
                    self.store.reset();
                }

                self.connections.open(Some(credential.clone())).await;
                *current = Some(credential);

                let store = self.store.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.load_all().await {
                        warn!(error = %e, "Initial notification load failed");
                    }
                });
            }
            None => {
                if current.take().is_some() {
                    info!("Session ended, tearing down push connection");
                    self.connections.close().await;
                    self.store.reset();
                }
            }
        }
    }
}
