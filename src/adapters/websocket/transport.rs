//! WebSocket implementation of the PushTransport port.
//!
//! Connects with tokio-tungstenite, passing the bearer token as the `token`
//! query parameter. A 401/403 answer to the upgrade request is reported as
//! `TransportError::Unauthorized`; everything else is a retryable failure.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::domain::foundation::Credential;
use crate::ports::{PushConnection, PushFrame, PushTransport, TransportError};

use super::messages::decode_frame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the websocket transport.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// `ws://` or `wss://` endpoint of the push channel.
    pub endpoint_url: String,
    /// Upper bound on connect plus handshake.
    pub connect_timeout: Duration,
}

impl WebSocketConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Push transport over a websocket.
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Endpoint with the token attached as a query parameter.
    fn connect_url(&self, credential: &Credential) -> Result<String, TransportError> {
        let mut url = Url::parse(&self.config.endpoint_url)
            .map_err(|e| TransportError::connect(format!("invalid endpoint url: {}", e)))?;
        url.query_pairs_mut().append_pair("token", credential.expose());
        Ok(url.to_string())
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn connect(&self, credential: &Credential) -> Result<Box<dyn PushConnection>, TransportError> {
        let url = self.connect_url(credential)?;

        let connected = tokio::time::timeout(self.config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout {
                timeout_secs: self.config.connect_timeout.as_secs(),
            })?;

        match connected {
            Ok((stream, response)) => {
                debug!(status = %response.status(), "Websocket handshake completed");
                Ok(Box::new(WebSocketConnection::new(stream)))
            }
            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                if status == 401 || status == 403 {
                    Err(TransportError::Unauthorized { status })
                } else {
                    Err(TransportError::connect(format!("handshake failed with status {}", status)))
                }
            }
            Err(e) => Err(TransportError::connect(e.to_string())),
        }
    }
}

/// One open websocket.
///
/// A read error is reported once; the connection then counts as closed.
pub struct WebSocketConnection {
    stream: WsStream,
    closed: bool,
}

impl WebSocketConnection {
    fn new(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl PushConnection for WebSocketConnection {
    async fn next_frame(&mut self) -> Option<Result<PushFrame, TransportError>> {
        if self.closed {
            return None;
        }

        match self.stream.next().await {
            None => {
                self.closed = true;
                None
            }
            Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                Ok(event) => Some(Ok(PushFrame::Event(event))),
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable push frame");
                    Some(Ok(PushFrame::Heartbeat))
                }
            },
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "Server closed push channel");
                self.closed = true;
                None
            }
            // Ping, pong, binary, raw frames: proof of life only.
            Some(Ok(_)) => Some(Ok(PushFrame::Heartbeat)),
            Some(Err(e)) => {
                self.closed = true;
                Some(Err(TransportError::protocol(e.to_string())))
            }
        }
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.stream
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| TransportError::protocol(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Error while closing push channel");
        }
    }
}
