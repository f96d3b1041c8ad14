//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the notification core.

mod credential;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use credential::Credential;
pub use errors::ValidationError;
pub use ids::{ConnectionSessionId, NotificationId, RecipientId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
