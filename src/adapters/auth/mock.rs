//! Mock credential verifier for the push server.
//!
//! # Example
//!
//! ```ignore
//! let verifier = MockCredentialVerifier::new()
//!     .with_token("coach-token", "coach-42");
//!
//! let recipient = verifier.verify("coach-token").await?;
//! assert_eq!(recipient.as_str(), "coach-42");
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::RecipientId;
use crate::ports::{CredentialVerifier, VerifyError};

/// Verifier backed by a token → recipient map.
///
/// Unknown tokens are `Rejected`.
#[derive(Debug, Default)]
pub struct MockCredentialVerifier {
    tokens: RwLock<HashMap<String, RecipientId>>,
    force_error: RwLock<Option<VerifyError>>,
}

impl MockCredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as `recipient`. Blank recipients are ignored.
    pub fn with_token(self, token: impl Into<String>, recipient: impl Into<String>) -> Self {
        if let Ok(recipient) = RecipientId::new(recipient) {
            self.write_tokens().insert(token.into(), recipient);
        }
        self
    }

    /// Forces every verification to fail with `error`.
    pub fn with_error(self, error: VerifyError) -> Self {
        *self
            .force_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
        self
    }

    /// Revokes a token.
    pub fn revoke(&self, token: &str) {
        self.write_tokens().remove(token);
    }

    fn write_tokens(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, RecipientId>> {
        self.tokens.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialVerifier for MockCredentialVerifier {
    async fn verify(&self, token: &str) -> Result<RecipientId, VerifyError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
            .ok_or(VerifyError::Rejected)
    }
}
