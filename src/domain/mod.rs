//! Domain layer containing the notification core's types and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, credential, errors)
//! - `notification` - Notification entity, push events and the reconciling ledger
//! - `connection` - Push connection state machine and reconnect policy

pub mod connection;
pub mod foundation;
pub mod notification;
