//! WebSocket upgrade handler for the push channel (server side).
//!
//! Handles the HTTP → WebSocket upgrade and the connection lifecycle:
//! 1. Verify the `token` query parameter before upgrading
//! 2. Upgrade to WebSocket
//! 3. Join the recipient's room
//! 4. Forward room events as text frames until either side closes
//! 5. Leave the room

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::foundation::RecipientId;
use crate::ports::{CredentialVerifier, VerifyError};

use super::messages::encode_event;
use super::rooms::{ClientId, PushHub};

/// State required by the push endpoint.
#[derive(Clone)]
pub struct PushServerState {
    pub hub: Arc<PushHub>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl PushServerState {
    pub fn new(hub: Arc<PushHub>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { hub, verifier }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    token: Option<String>,
}

/// Route: `GET /realtime?token=...`
///
/// A missing or rejected token is answered with 401 before any upgrade,
/// which clients treat as an expired session.
pub async fn push_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<PushServerState>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    };

    let recipient = match state.verifier.verify(&token).await {
        Ok(recipient) => recipient,
        Err(VerifyError::Rejected) => {
            tracing::debug!("Push handshake with rejected token");
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
        Err(VerifyError::Unavailable(reason)) => {
            tracing::error!(%reason, "Credential verifier unavailable");
            return (StatusCode::SERVICE_UNAVAILABLE, "auth unavailable").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, recipient, state))
}

async fn handle_socket(socket: WebSocket, recipient: RecipientId, state: PushServerState) {
    let client_id = ClientId::new();
    let mut room_rx = state.hub.join(&recipient, client_id.clone()).await;
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(client_id = %client_id, recipient = %recipient, "Push client connected");

    loop {
        tokio::select! {
            update = room_rx.recv() => match update {
                Ok(event) => {
                    let text = match encode_event(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(client_id = %client_id, error = %e, "Failed to encode push event");
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(client_id = %client_id, skipped, "Push client lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) => {
                    tracing::trace!(client_id = %client_id, "Ignoring client frame");
                }
                // Ping and pong are answered by axum.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(client_id = %client_id, "Receive error: {}", e);
                    break;
                }
            },
        }
    }

    drop(room_rx);
    state.hub.leave(&client_id).await;
    tracing::debug!(client_id = %client_id, "Push client disconnected");
}

/// Router exposing the push endpoint.
///
/// ```ignore
/// let app = push_router().with_state(PushServerState::new(hub, verifier));
/// ```
pub fn push_router() -> Router<PushServerState> {
    Router::new().route("/realtime", get(push_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockCredentialVerifier;

    #[test]
    fn state_shares_the_hub() {
        let hub = Arc::new(PushHub::default());
        let state = PushServerState::new(hub.clone(), Arc::new(MockCredentialVerifier::new()));

        assert!(Arc::ptr_eq(&state.hub, &hub));
    }

    #[test]
    fn query_token_is_optional() {
        let query: ConnectQuery = serde_json::from_str("{}").unwrap();
        assert!(query.token.is_none());
    }
}
