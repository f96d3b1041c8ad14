//! In-memory AuthSession.
//!
//! Holds the current credential in a watch channel. The binary seeds it
//! from configuration; tests drive login and logout directly.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::foundation::Credential;
use crate::ports::AuthSession;

/// AuthSession backed by a watch channel.
///
/// A rejected credential ends the session if it is still the current one.
#[derive(Debug)]
pub struct InMemoryAuthSession {
    session: watch::Sender<Option<Credential>>,
    rejections: AtomicUsize,
}

impl Default for InMemoryAuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthSession {
    /// Creates a logged-out session.
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            session,
            rejections: AtomicUsize::new(0),
        }
    }

    /// Creates a session already logged in with `token`.
    ///
    /// A blank token leaves the session logged out.
    pub fn with_token(token: impl Into<String>) -> Self {
        let auth = Self::new();
        auth.login(token);
        auth
    }

    /// Starts a session. Returns the credential, or `None` for a blank token.
    pub fn login(&self, token: impl Into<String>) -> Option<Credential> {
        let credential = Credential::new(token)?;
        self.session.send_replace(Some(credential.clone()));
        info!("Auth session started");
        Some(credential)
    }

    /// Ends the session.
    pub fn logout(&self) {
        if self.session.send_replace(None).is_some() {
            info!("Auth session ended");
        }
    }

    /// How many times a credential was reported as rejected.
    pub fn rejection_count(&self) -> usize {
        self.rejections.load(Ordering::SeqCst)
    }
}

impl AuthSession for InMemoryAuthSession {
    fn current_credential(&self) -> Option<Credential> {
        self.session.borrow().clone()
    }

    fn watch_session(&self) -> watch::Receiver<Option<Credential>> {
        self.session.subscribe()
    }

    fn credential_rejected(&self, credential: &Credential) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
        let ended = self.session.send_if_modified(|current| {
            if current.as_ref() == Some(credential) {
                *current = None;
                true
            } else {
                false
            }
        });
        if ended {
            warn!("Credential rejected by server, session ended");
        }
    }
}
