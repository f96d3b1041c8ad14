//! PushTransport port - the bidirectional push channel.
//!
//! The connection manager owns the lifecycle (retry, heartbeat, teardown);
//! a transport only knows how to open one connection and read frames off it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::Credential;
use crate::domain::notification::PushEvent;

/// Opens push connections authenticated with a bearer credential.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Performs the connect and auth handshake.
    ///
    /// A credential refused at handshake must surface as
    /// `TransportError::Unauthorized` so the caller stops retrying.
    async fn connect(&self, credential: &Credential) -> Result<Box<dyn PushConnection>, TransportError>;
}

/// One live push connection.
#[async_trait]
pub trait PushConnection: Send {
    /// Next inbound frame. `None` once the peer has closed the connection.
    async fn next_frame(&mut self) -> Option<Result<PushFrame, TransportError>>;

    /// Sends a transport-level liveness probe.
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Closes the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// What a connection yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// An application event.
    Event(PushEvent),
    /// Transport-level traffic (pong, ping, malformed payload already logged).
    Heartbeat,
}

/// Receives decoded events in delivery order.
///
/// Called from the single connection task; implementations must not block.
pub trait PushEventHandler: Send + Sync {
    fn handle(&self, event: PushEvent);

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Errors from the push transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The handshake refused the credential.
    #[error("push handshake rejected (status {status})")]
    Unauthorized { status: u16 },

    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The peer violated the protocol or the socket failed mid-stream.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connecting took longer than allowed.
    #[error("connect timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The connection is already closed.
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true if retrying with the same credential is pointless.
    pub fn is_auth(&self) -> bool {
        matches!(self, TransportError::Unauthorized { .. })
    }
}
