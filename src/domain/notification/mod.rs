//! Notification module - the reconciled notification collection.
//!
//! - `Notification` - the entity as delivered by the server
//! - `PushEvent` - server-originated changes
//! - `NotificationLedger` - ordered list plus unread count, with undo tokens
//!   for optimistic commands

mod errors;
mod events;
mod ledger;
mod notification;

pub use errors::{MutationKind, NotificationError};
pub use events::PushEvent;
pub use ledger::{CreateOutcome, NotificationLedger, ReadChange, Removal};
pub use notification::Notification;
