//! WebSocket adapters for the push channel.
//!
//! # Architecture
//!
//! ```text
//!  server                                   client
//! ┌──────────────┐   {"event","data"}   ┌────────────────────┐
//! │ PushHub      │ ───────────────────▶ │ WebSocketTransport │
//! │ push_handler │      ws + ?token     │ WebSocketConnection│
//! └──────────────┘                      └────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire format shared by both ends
//! - [`transport`] - client `PushTransport` over tokio-tungstenite
//! - [`scripted`] - test transport driven by the test itself
//! - [`rooms`] - per-recipient fan-out on the server
//! - [`handler`] - axum upgrade handler for `GET /realtime`

pub mod handler;
pub mod messages;
pub mod rooms;
pub mod scripted;
pub mod transport;

pub use handler::{push_handler, push_router, PushServerState};
pub use messages::{decode_frame, encode_event, DecodeError, WireFrame};
pub use rooms::{ClientId, PushHub};
pub use scripted::{ScriptedPeer, ScriptedTransport};
pub use transport::{WebSocketConfig, WebSocketConnection, WebSocketTransport};
