//! AuthSession port - the authentication collaborator.
//!
//! Token storage and login flows live outside this crate. The notification
//! core only needs to read the current credential, follow session changes,
//! and report a credential the server refused.

use tokio::sync::watch;

use crate::domain::foundation::Credential;

/// Source of the authenticated identity's bearer credential.
pub trait AuthSession: Send + Sync {
    /// The credential of the current session, if any.
    fn current_credential(&self) -> Option<Credential>;

    /// Follows session start and end. `None` means logged out.
    fn watch_session(&self) -> watch::Receiver<Option<Credential>>;

    /// Reports that the server refused `credential` (401/403 or handshake).
    ///
    /// Implementations typically end the session, which the supervisor
    /// observes through `watch_session`.
    fn credential_rejected(&self, credential: &Credential);
}
