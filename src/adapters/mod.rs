//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the notification core to external systems:
//! - `http` - REST client for the notification endpoints
//! - `websocket` - push channel transport (client) and push hub (server)
//! - `auth` - auth session and credential verifier implementations

pub mod auth;
pub mod http;
pub mod websocket;

pub use auth::{InMemoryAuthSession, MockCredentialVerifier};
pub use http::{HttpApiConfig, HttpNotificationApi, MockNotificationApi};
pub use websocket::{PushHub, ScriptedTransport, WebSocketConfig, WebSocketTransport};
