use crate::error::KeystoreError;
use crate::hardware::{HardwareKeyHandle, HardwareKeyStore};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use svault_domain::{AuthContext, KeyTag};
use tracing::{debug, info, warn};

/// Owns creation, lookup and deletion of hardware keys.
///
/// Lookup-then-create runs under a per-tag lock, so concurrent callers in this process
/// never generate two keys for the same tag. Different tags do not contend.
pub struct KeyLifecycleManager {
    store: Arc<dyn HardwareKeyStore>,
    locks: Mutex<FxHashMap<KeyTag, Arc<Mutex<()>>>>,
}

impl KeyLifecycleManager {
    #[must_use]
    pub fn new(store: Arc<dyn HardwareKeyStore>) -> Self {
        Self { store, locks: Mutex::new(FxHashMap::default()) }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn HardwareKeyStore> {
        &self.store
    }

    /// Returns the key for `tag`, generating it under `ctx` when absent.
    ///
    /// # Errors
    /// [`KeystoreError::AuthenticationRequired`] if `ctx` was already invalidated; otherwise
    /// whatever the hardware reports.
    pub fn ensure_key(
        &self,
        tag: &KeyTag,
        ctx: &AuthContext,
    ) -> Result<HardwareKeyHandle, KeystoreError> {
        require_live(Some(ctx))?;

        let lock = self.lock_for(tag);
        let _flight = lock.lock();

        if let Some(handle) = self.store.find(tag)? {
            debug!(tag = %tag, slot = handle.slot(), "Hardware key found");
            return Ok(handle);
        }

        let handle = self.store.generate(tag, ctx)?;
        info!(tag = %tag, slot = handle.slot(), "Hardware key generated");
        Ok(handle)
    }

    /// Returns the existing key for `tag` without ever creating one.
    ///
    /// A missing or invalidated context fails with [`KeystoreError::AuthenticationRequired`]
    /// before the hardware is touched; a missing key is [`KeystoreError::Unavailable`].
    ///
    /// # Errors
    /// See above, plus any hardware failure.
    pub fn fetch_key(
        &self,
        tag: &KeyTag,
        ctx: Option<&AuthContext>,
    ) -> Result<HardwareKeyHandle, KeystoreError> {
        require_live(ctx)?;

        self.store
            .find(tag)?
            .ok_or_else(|| KeystoreError::unavailable(format!("no hardware key for {tag}")))
    }

    /// Deletes the key for `tag`. Returns `true` when it is gone afterwards, including when
    /// it never existed; `false` when the hardware refused.
    pub fn drop_key(&self, tag: &KeyTag) -> bool {
        let lock = self.lock_for(tag);
        let flight = lock.lock();

        let gone = match self.store.delete(tag) {
            Ok(existed) => {
                info!(tag = %tag, existed, "Hardware key dropped");
                true
            }
            Err(err) => {
                warn!(tag = %tag, error = %err, "Hardware refused to drop key");
                false
            }
        };

        drop(flight);
        if gone {
            self.locks.lock().remove(tag);
        }
        gone
    }

    fn lock_for(&self, tag: &KeyTag) -> Arc<Mutex<()>> {
        self.locks.lock().entry(tag.clone()).or_default().clone()
    }
}

fn require_live(ctx: Option<&AuthContext>) -> Result<(), KeystoreError> {
    match ctx {
        None => Err(KeystoreError::auth_required("no authenticated context")),
        Some(ctx) if ctx.is_revoked() => Err(KeystoreError::auth_required(format!(
            "authenticated context {} was invalidated",
            ctx.id()
        ))),
        Some(_) => Ok(()),
    }
}

impl fmt::Debug for KeyLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLifecycleManager")
            .field("store", &self.store)
            .field("tags", &self.locks.lock().len())
            .finish()
    }
}
