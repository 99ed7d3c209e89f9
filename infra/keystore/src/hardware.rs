//! Capability interface to secure hardware.
//!
//! Implementations keep key material inside their boundary: callers only ever hold a
//! [`HardwareKeyHandle`] and ask the hardware to seal, unseal or agree on their behalf.
//! Every use takes an [`AuthContext`]; the hardware decides whether that context is still
//! good enough and answers [`KeystoreError::AuthenticationRequired`] when it is not.

use crate::error::KeystoreError;
use std::fmt;
use std::sync::Arc;
use svault_domain::{AuthContext, CipherStrategy, KeyTag};
use zeroize::Zeroizing;

/// Length of the outer IV prefix written in front of hardware-sealed bytes.
pub const OUTER_IV_LEN: usize = 16;

/// Opaque reference to a key living inside secure hardware.
#[derive(Clone, PartialEq, Eq)]
pub struct HardwareKeyHandle {
    tag: KeyTag,
    strategy: CipherStrategy,
    slot: u64,
    public_key: Option<Arc<[u8]>>,
}

impl HardwareKeyHandle {
    /// `slot` is the hardware's own identifier; a re-generated key gets a new one.
    #[must_use]
    pub const fn new(tag: KeyTag, strategy: CipherStrategy, slot: u64) -> Self {
        Self { tag, strategy, slot, public_key: None }
    }

    /// Attaches the SEC1 uncompressed public half of an asymmetric key.
    #[must_use]
    pub fn with_public_key(mut self, public_key: impl Into<Arc<[u8]>>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    #[must_use]
    pub const fn tag(&self) -> &KeyTag {
        &self.tag
    }

    #[must_use]
    pub const fn strategy(&self) -> CipherStrategy {
        self.strategy
    }

    #[must_use]
    pub const fn slot(&self) -> u64 {
        self.slot
    }

    #[must_use]
    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }
}

impl fmt::Debug for HardwareKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareKeyHandle")
            .field("tag", &self.tag.to_string())
            .field("strategy", &self.strategy)
            .field("slot", &self.slot)
            .field("public_key", &self.public_key.as_ref().map(|k| k.len()))
            .finish()
    }
}

/// Output of a hardware seal. `iv` is `None` when the fallback fixed-parameter mode was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterSealed {
    pub iv: Option<[u8; OUTER_IV_LEN]>,
    pub ciphertext: Vec<u8>,
}

/// Secure hardware able to hold one key per [`KeyTag`].
///
/// Calls may block on the hardware or on a modal prompt, so callers keep them off async
/// executors (`spawn_blocking`).
pub trait HardwareKeyStore: Send + Sync + fmt::Debug {
    /// Key family this hardware produces.
    fn strategy(&self) -> CipherStrategy;

    /// Whether [`seal`](Self::seal) can draw a fresh random IV per call.
    fn supports_random_iv(&self) -> bool;

    /// Looks a key up without using it; no authenticated context is needed.
    ///
    /// # Errors
    /// [`KeystoreError::Unavailable`] if the hardware cannot be queried.
    fn find(&self, tag: &KeyTag) -> Result<Option<HardwareKeyHandle>, KeystoreError>;

    /// Generates a non-exportable key bound to `tag`, replacing nothing.
    ///
    /// # Errors
    /// [`KeystoreError::AuthenticationRequired`] for a stale context,
    /// [`KeystoreError::CredentialRejected`] when the paranoid policy lacks a password,
    /// [`KeystoreError::Unavailable`] when the hardware refuses.
    fn generate(&self, tag: &KeyTag, ctx: &AuthContext) -> Result<HardwareKeyHandle, KeystoreError>;

    /// Deletes the key. `Ok(false)` when nothing was stored under `tag`.
    ///
    /// # Errors
    /// [`KeystoreError::Unavailable`] when the hardware refuses.
    fn delete(&self, tag: &KeyTag) -> Result<bool, KeystoreError>;

    /// Encrypts with a symmetric hardware key.
    ///
    /// # Errors
    /// Authorization errors as for [`generate`](Self::generate), or
    /// [`KeystoreError::Unsupported`] on asymmetric keys.
    fn seal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        plaintext: &[u8],
    ) -> Result<OuterSealed, KeystoreError>;

    /// Decrypts bytes produced by [`seal`](Self::seal).
    ///
    /// # Errors
    /// [`KeystoreError::Crypto`] when the tag does not verify, plus authorization errors.
    fn unseal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        iv: Option<&[u8; OUTER_IV_LEN]>,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError>;

    /// Elliptic-curve key agreement with the private half; returns the raw shared secret.
    ///
    /// # Errors
    /// [`KeystoreError::Crypto`] for a malformed peer key, plus authorization errors.
    fn agree(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        peer_public: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError>;
}

impl<T> HardwareKeyStore for Arc<T>
where
    T: HardwareKeyStore + ?Sized,
{
    fn strategy(&self) -> CipherStrategy {
        (**self).strategy()
    }

    fn supports_random_iv(&self) -> bool {
        (**self).supports_random_iv()
    }

    fn find(&self, tag: &KeyTag) -> Result<Option<HardwareKeyHandle>, KeystoreError> {
        (**self).find(tag)
    }

    fn generate(
        &self,
        tag: &KeyTag,
        ctx: &AuthContext,
    ) -> Result<HardwareKeyHandle, KeystoreError> {
        (**self).generate(tag, ctx)
    }

    fn delete(&self, tag: &KeyTag) -> Result<bool, KeystoreError> {
        (**self).delete(tag)
    }

    fn seal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        plaintext: &[u8],
    ) -> Result<OuterSealed, KeystoreError> {
        (**self).seal(key, ctx, plaintext)
    }

    fn unseal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        iv: Option<&[u8; OUTER_IV_LEN]>,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        (**self).unseal(key, ctx, iv, ciphertext)
    }

    fn agree(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        peer_public: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        (**self).agree(key, ctx, peer_public)
    }
}
