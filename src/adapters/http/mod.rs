//! HTTP adapters for the notification REST endpoints.
//!
//! - `notification_client` - reqwest client used in production
//! - `mock_api` - in-memory backend for tests

mod mock_api;
mod notification_client;

pub use mock_api::{ApiCall, ApiCallKind, ApiHold, MockNotificationApi};
pub use notification_client::{HttpApiConfig, HttpNotificationApi};
