//! ConnectionManager - lifecycle of the push connection.
//!
//! Owns at most one connection session at a time. A session is a background
//! task that connects, pumps frames into the event handler, keeps the link
//! alive with pings and reconnects with bounded exponential backoff.
//!
//! ## State flow
//!
//! ```text
//! open ─▶ CONNECTING ─▶ CONNECTED ─▶ (drop) DISCONNECTED ─▶ backoff ─▶ CONNECTING ...
//!              │                                                  │
//!              └─ handshake 401/403 ─▶ ERROR (auth notified)       └─ budget spent ─▶ ERROR
//! ```
//!
//! ## Graceful Shutdown
//!
//! `close()` signals the session task over a watch channel and waits for it
//! to exit. The signal interrupts connects, reads and backoff sleeps alike.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::connection::{ConnectionState, ReconnectPolicy};
use crate::domain::foundation::{ConnectionSessionId, Credential, StateMachine};
use crate::domain::notification::NotificationError;
use crate::ports::{AuthSession, PushConnection, PushEventHandler, PushFrame, PushTransport};

/// Timing knobs of a connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Idle time after which a ping is sent.
    pub heartbeat_interval: Duration,
    /// How long to wait for any frame after a ping.
    pub pong_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(25),
            pong_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// State shared between the manager and its session task.
struct Shared {
    state: watch::Sender<ConnectionState>,
    last_error: Mutex<Option<NotificationError>>,
    connect_attempts: AtomicU32,
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if !current.can_transition_to(&next) {
                warn!(from = %current, to = %next, "Unexpected connection state transition");
            }
            debug!(from = %current, to = %next, "Connection state changed");
            *current = next;
            true
        });
    }

    fn fail(&self, error: NotificationError) {
        *self.last_error.lock().unwrap_or_else(|p| p.into_inner()) = Some(error);
        self.set_state(ConnectionState::Error);
    }

    fn clear_error(&self) {
        *self.last_error.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

struct ActiveSession {
    id: ConnectionSessionId,
    credential: Credential,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Keeps exactly one push connection alive per authenticated identity.
pub struct ConnectionManager {
    transport: Arc<dyn PushTransport>,
    handler: Arc<dyn PushEventHandler>,
    auth: Option<Arc<dyn AuthSession>>,
    settings: ConnectionSettings,
    active: AsyncMutex<Option<ActiveSession>>,
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        handler: Arc<dyn PushEventHandler>,
        settings: ConnectionSettings,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            handler,
            auth: None,
            settings,
            active: AsyncMutex::new(None),
            shared: Arc::new(Shared {
                state,
                last_error: Mutex::new(None),
                connect_attempts: AtomicU32::new(0),
            }),
        }
    }

    /// Reports handshake rejections to the auth collaborator.
    pub fn with_auth_session(mut self, auth: Arc<dyn AuthSession>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// The error that put the manager into `ERROR`, if any.
    pub fn last_error(&self) -> Option<NotificationError> {
        self.shared
            .last_error
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Outbound connection attempts since the manager was created.
    pub fn connect_attempts(&self) -> u32 {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    /// Id of the current session, if one is running.
    pub async fn session_id(&self) -> Option<ConnectionSessionId> {
        self.active.lock().await.as_ref().map(|s| s.id)
    }

    /// Starts a session for `credential`.
    ///
    /// Idempotent: the same credential while connecting or connected keeps
    /// the running session. Anything else tears the old session down first.
    /// Without a credential this does nothing.
    pub async fn open(&self, credential: Option<Credential>) -> Option<ConnectionSessionId> {
        let Some(credential) = credential else {
            debug!("No credential, push connection not opened");
            return None;
        };

        let mut active = self.active.lock().await;

        if let Some(session) = active.as_ref() {
            if session.credential == credential
                && self.state().is_active()
                && !session.task.is_finished()
            {
                debug!(session_id = %session.id, "Push session already open");
                return Some(session.id);
            }
        }

        if let Some(previous) = active.take() {
            Self::stop(previous).await;
        }

        let id = ConnectionSessionId::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shared.clear_error();
        self.shared.set_state(ConnectionState::Connecting);

        let worker = SessionWorker {
            id,
            credential: credential.clone(),
            transport: self.transport.clone(),
            handler: self.handler.clone(),
            auth: self.auth.clone(),
            settings: self.settings,
            shared: self.shared.clone(),
        };
        let task = tokio::spawn(worker.run(shutdown_rx));

        *active = Some(ActiveSession {
            id,
            credential,
            shutdown: shutdown_tx,
            task,
        });
        info!(session_id = %id, handler = self.handler.name(), "Push session opened");
        Some(id)
    }

    /// Tears the current session down. Safe to call repeatedly.
    pub async fn close(&self) {
        let previous = self.active.lock().await.take();
        if let Some(session) = previous {
            let id = session.id;
            Self::stop(session).await;
            info!(session_id = %id, "Push session closed");
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    async fn stop(session: ActiveSession) {
        let _ = session.shutdown.send(true);
        if let Err(e) = session.task.await {
            warn!(session_id = %session.id, error = %e, "Push session task ended abnormally");
        }
    }
}

enum PumpOutcome {
    Shutdown,
    Dropped,
}

/// The background task of one connection session.
struct SessionWorker {
    id: ConnectionSessionId,
    credential: Credential,
    transport: Arc<dyn PushTransport>,
    handler: Arc<dyn PushEventHandler>,
    auth: Option<Arc<dyn AuthSession>>,
    settings: ConnectionSettings,
    shared: Arc<Shared>,
}

impl SessionWorker {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        // Reconnect attempt number, reset by every successful connect.
        let mut attempt: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.shared.set_state(ConnectionState::Connecting);
            self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst);

            let connected = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                result = self.transport.connect(&self.credential) => result,
            };

            match connected {
                Ok(mut connection) => {
                    attempt = 0;
                    self.shared.set_state(ConnectionState::Connected);
                    info!(session_id = %self.id, "Push channel connected");

                    let outcome = self.pump(connection.as_mut(), &mut shutdown).await;
                    connection.close().await;

                    if let PumpOutcome::Shutdown = outcome {
                        break;
                    }
                    self.shared.set_state(ConnectionState::Disconnected);
                    info!(session_id = %self.id, "Push channel dropped");
                }
                Err(e) if e.is_auth() => {
                    warn!(session_id = %self.id, error = %e, "Push handshake rejected the credential");
                    self.shared.fail(NotificationError::AuthExpired);
                    if let Some(auth) = &self.auth {
                        auth.credential_rejected(&self.credential);
                    }
                    return;
                }
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Push connect failed");
                    self.shared.set_state(ConnectionState::Disconnected);
                }
            }

            attempt += 1;
            let Some(delay) = self.settings.reconnect.delay_for(attempt) else {
                let max = self.settings.reconnect.max_attempts();
                warn!(session_id = %self.id, max, "Giving up on push channel");
                self.shared.fail(NotificationError::Connection(format!(
                    "gave up after {} reconnect attempts",
                    max
                )));
                return;
            };

            debug!(
                session_id = %self.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.shared.set_state(ConnectionState::Disconnected);
        debug!(session_id = %self.id, "Push session task stopped");
    }

    /// Reads frames until the connection drops or shutdown is requested.
    async fn pump(
        &self,
        connection: &mut dyn PushConnection,
        shutdown: &mut watch::Receiver<bool>,
    ) -> PumpOutcome {
        let mut awaiting_pong = false;

        loop {
            let wait = if awaiting_pong {
                self.settings.pong_timeout
            } else {
                self.settings.heartbeat_interval
            };

            let next = tokio::select! {
                _ = wait_for_shutdown(shutdown) => return PumpOutcome::Shutdown,
                frame = tokio::time::timeout(wait, connection.next_frame()) => frame,
            };

            match next {
                Err(_) if awaiting_pong => {
                    warn!(session_id = %self.id, "No answer to ping, treating connection as dead");
                    return PumpOutcome::Dropped;
                }
                Err(_) => {
                    if let Err(e) = connection.ping().await {
                        warn!(session_id = %self.id, error = %e, "Ping failed");
                        return PumpOutcome::Dropped;
                    }
                    awaiting_pong = true;
                }
                Ok(None) => return PumpOutcome::Dropped,
                Ok(Some(Ok(frame))) => {
                    awaiting_pong = false;
                    self.shared.set_state(ConnectionState::Connected);
                    if let PushFrame::Event(event) = frame {
                        debug!(session_id = %self.id, kind = event.kind(), "Push event received");
                        self.handler.handle(event);
                    }
                }
                Ok(Some(Err(e))) => {
                    // The disconnect that follows drives recovery.
                    warn!(session_id = %self.id, error = %e, "Push transport error");
                    self.shared.set_state(ConnectionState::Error);
                }
            }
        }
    }
}

/// Resolves once shutdown is requested or the manager is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
