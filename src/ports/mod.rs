//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the notification core and the outside world. Adapters implement these
//! ports.
//!
//! ## Client Ports
//!
//! - `NotificationApi` - REST access to the notification collection
//! - `PushTransport` / `PushConnection` - the push channel
//! - `PushEventHandler` - consumer of decoded push events
//! - `AuthSession` - the authentication collaborator
//!
//! ## Server Ports
//!
//! - `CredentialVerifier` - resolves handshake tokens to recipients

mod auth_session;
mod credential_verifier;
mod notification_api;
mod push_transport;

pub use auth_session::AuthSession;
pub use credential_verifier::{CredentialVerifier, VerifyError};
pub use notification_api::{ApiError, NotificationApi};
pub use push_transport::{PushConnection, PushEventHandler, PushFrame, PushTransport, TransportError};
