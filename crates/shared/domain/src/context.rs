//! Authenticated context.
//!
//! Proof that the user recently passed the platform challenge. The session mints one per
//! successful prompt and revokes it on invalidation; secure hardware refuses contexts that
//! are revoked or older than its own validity window.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct AuthContext {
    id: u64,
    authenticated_at: Instant,
    revoked: Arc<AtomicBool>,
    credential: Option<Arc<Zeroizing<Vec<u8>>>>,
}

impl AuthContext {
    #[must_use]
    pub fn new(id: u64, authenticated_at: Instant) -> Self {
        Self { id, authenticated_at, revoked: Arc::new(AtomicBool::new(false)), credential: None }
    }

    /// Binds an application password to the context (paranoid policy second factor).
    #[must_use]
    pub fn with_credential(mut self, credential: Zeroizing<Vec<u8>>) -> Self {
        self.credential = Some(Arc::new(credential));
        self
    }

    /// Drops a bound application password; revocation stays shared with earlier clones.
    #[must_use]
    pub fn without_credential(mut self) -> Self {
        self.credential = None;
        self
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn authenticated_at(&self) -> Instant {
        self.authenticated_at
    }

    #[must_use]
    pub fn credential(&self) -> Option<&[u8]> {
        self.credential.as_deref().map(|c| c.as_slice())
    }

    /// Revocation is shared by every clone of the context.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("id", &self.id)
            .field("authenticated_at", &self.authenticated_at)
            .field("revoked", &self.is_revoked())
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
