//! Scripted PushTransport for testing.
//!
//! Every successful `connect` creates a `ScriptedPeer` the test holds on to
//! and uses to play the server: push events, inject transport errors, drop
//! the connection. Connects can be refused ahead of time.
//!
//! # Example
//!
//! ```ignore
//! let transport = Arc::new(ScriptedTransport::new());
//! transport.refuse_next(TransportError::Unauthorized { status: 401 });
//!
//! let manager = ConnectionManager::new(transport.clone(), handler, settings);
//! manager.open(Some(credential)).await;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::domain::foundation::Credential;
use crate::domain::notification::PushEvent;
use crate::ports::{PushConnection, PushFrame, PushTransport, TransportError};

enum PeerMessage {
    Event(PushEvent),
    Error(TransportError),
    Disconnect,
}

/// The server end of one scripted connection.
#[derive(Clone)]
pub struct ScriptedPeer {
    tx: mpsc::UnboundedSender<PeerMessage>,
    pings: Arc<AtomicUsize>,
    auto_pong: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl ScriptedPeer {
    /// Delivers an event. Returns false if the client side is gone.
    pub fn send_event(&self, event: PushEvent) -> bool {
        self.tx.send(PeerMessage::Event(event)).is_ok()
    }

    /// Makes the next read fail with `error`.
    pub fn send_error(&self, error: TransportError) -> bool {
        self.tx.send(PeerMessage::Error(error)).is_ok()
    }

    /// Ends the connection from the server side.
    pub fn disconnect(&self) -> bool {
        self.tx.send(PeerMessage::Disconnect).is_ok()
    }

    /// How many liveness probes the client sent.
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// When disabled, pings go unanswered.
    pub fn set_auto_pong(&self, enabled: bool) {
        self.auto_pong.store(enabled, Ordering::SeqCst);
    }

    /// True once the client closed its end.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct ScriptState {
    refusals: VecDeque<TransportError>,
    peers: Vec<ScriptedPeer>,
    tokens: Vec<String>,
}

/// Transport whose connections are driven by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
    connects: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next connect fail with `error`.
    pub fn refuse_next(&self, error: TransportError) {
        self.state().refusals.push_back(error);
    }

    /// Makes every one of the next `count` connects fail with `error`.
    pub fn refuse_times(&self, count: usize, error: TransportError) {
        let mut state = self.state();
        for _ in 0..count {
            state.refusals.push_back(error.clone());
        }
    }

    /// Connect attempts so far, refused ones included.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Peers of accepted connections, oldest first.
    pub fn peers(&self) -> Vec<ScriptedPeer> {
        self.state().peers.clone()
    }

    pub fn last_peer(&self) -> Option<ScriptedPeer> {
        self.state().peers.last().cloned()
    }

    /// Tokens presented on each connect attempt.
    pub fn tokens(&self) -> Vec<String> {
        self.state().tokens.clone()
    }

    /// Waits until `count` connections have been accepted, then returns the newest peer.
    ///
    /// Gives up after two seconds.
    pub async fn wait_for_peer(&self, count: usize) -> Option<ScriptedPeer> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            {
                let state = self.state();
                if state.peers.len() >= count {
                    return state.peers.get(count.saturating_sub(1)).cloned();
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Waits until at least `count` connect attempts were made. Gives up after two seconds.
    pub async fn wait_for_connects(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.connect_count() < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn connect(&self, credential: &Credential) -> Result<Box<dyn PushConnection>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.tokens.push(credential.expose().to_string());

        if let Some(error) = state.refusals.pop_front() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let peer = ScriptedPeer {
            tx,
            pings: Arc::new(AtomicUsize::new(0)),
            auto_pong: Arc::new(AtomicBool::new(true)),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let connection = ScriptedConnection {
            rx,
            pings: peer.pings.clone(),
            auto_pong: peer.auto_pong.clone(),
            closed: peer.closed.clone(),
            pong_due: false,
            ended: false,
        };
        state.peers.push(peer);
        Ok(Box::new(connection))
    }
}

struct ScriptedConnection {
    rx: mpsc::UnboundedReceiver<PeerMessage>,
    pings: Arc<AtomicUsize>,
    auto_pong: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    pong_due: bool,
    ended: bool,
}

#[async_trait]
impl PushConnection for ScriptedConnection {
    async fn next_frame(&mut self) -> Option<Result<PushFrame, TransportError>> {
        if self.ended {
            return None;
        }
        if self.pong_due && self.auto_pong.load(Ordering::SeqCst) {
            self.pong_due = false;
            return Some(Ok(PushFrame::Heartbeat));
        }

        match self.rx.recv().await {
            Some(PeerMessage::Event(event)) => Some(Ok(PushFrame::Event(event))),
            Some(PeerMessage::Error(error)) => Some(Err(error)),
            Some(PeerMessage::Disconnect) | None => {
                self.ended = true;
                None
            }
        }
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if self.ended {
            return Err(TransportError::Closed);
        }
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.pong_due = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.ended = true;
        self.closed.store(true, Ordering::SeqCst);
        self.rx.close();
    }
}
