//! CredentialVerifier port - server-side check of push handshake tokens.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::RecipientId;

/// Resolves a bearer token to the recipient whose room it may join.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<RecipientId, VerifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Token is unknown, malformed or expired.
    #[error("credential rejected")]
    Rejected,

    /// The identity provider could not be reached.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}
