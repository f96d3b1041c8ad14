//! Connection module - push channel lifecycle primitives.

mod backoff;
mod state;

pub use backoff::ReconnectPolicy;
pub use state::ConnectionState;
