//! Bearer credential value object.

use secrecy::{ExposeSecret, Secret};
use std::fmt;
use std::sync::Arc;

/// Short-lived bearer token of the authenticated identity.
///
/// The token never appears in `Debug` output. Cloning shares the same
/// secret allocation.
#[derive(Clone)]
pub struct Credential(Arc<Secret<String>>);

impl Credential {
    /// Wraps a token. Blank tokens are not credentials and yield `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return None;
        }
        Some(Self(Arc::new(Secret::new(token))))
    }

    /// Exposes the raw token for placing it on the wire.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}
