//! Application layer - orchestration of the notification core.
//!
//! Coordinates the domain ledger with the ports:
//! - `NotificationStore` owns the notification list and runs user commands
//! - `EventDispatcher` feeds push events into the store
//! - `ConnectionManager` keeps the push channel alive
//! - `SessionSupervisor` follows the auth session
//! - presentation adapters expose view models and user actions

pub mod connection_manager;
pub mod dispatcher;
pub mod presentation;
pub mod store;
pub mod supervisor;

pub use connection_manager::{ConnectionManager, ConnectionSettings};
pub use dispatcher::EventDispatcher;
pub use presentation::{
    badge_label, relative_time, NotificationBadge, NotificationList, NotificationPopover,
    NotificationRow, PREVIEW_LIMIT,
};
pub use store::{NotificationSnapshot, NotificationStore, DEFAULT_ALERT_CAPACITY};
pub use supervisor::SessionSupervisor;
