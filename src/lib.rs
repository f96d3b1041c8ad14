//! Coach Realtime - real-time notification delivery for the coaching portal
//!
//! Keeps one push connection per signed-in identity, reconciles pushed
//! events with REST command results into a single notification list and
//! exposes that list to badge, popover and list views.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
