//! Authentication adapters.
//!
//! - `in_memory` - `AuthSession` held in a watch channel (client side)
//! - `mock` - `CredentialVerifier` backed by a token map (push server side)

mod in_memory;
mod mock;

pub use in_memory::InMemoryAuthSession;
pub use mock::MockCredentialVerifier;
