//! Software emulation of a secure element.
//!
//! Used by tests and by the bridge on hosts without secure hardware. Key material never
//! leaves this type; it enforces the same rules a real enclave would: revoked contexts are
//! refused, contexts expire after `auth_validity`, and paranoid keys demand the application
//! password that was bound at generation time.

use crate::ecc;
use crate::error::KeystoreError;
use crate::hardware::{HardwareKeyHandle, HardwareKeyStore, OUTER_IV_LEN, OuterSealed};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use fxhash::FxHashMap;
use p256::SecretKey;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use svault_domain::config::KeystoreConfig;
use svault_domain::constants::DEFAULT_AUTH_VALIDITY_SECS;
use svault_domain::{AuthContext, CipherStrategy, KeyPolicy, KeyTag};
use tracing::debug;
use zeroize::Zeroizing;

/// AES-256-GCM with the 16-byte IV used for hardware-sealed data.
type OuterCipher = AesGcm<Aes256, U16>;

enum Material {
    Aes(Zeroizing<[u8; 32]>),
    Ec(SecretKey),
}

struct Slot {
    id: u64,
    material: Material,
    credential_digest: Option<[u8; 32]>,
}

pub struct SoftwareKeyStore {
    strategy: CipherStrategy,
    random_iv: bool,
    auth_validity: Duration,
    available: AtomicBool,
    next_slot: AtomicU64,
    generated: AtomicUsize,
    slots: Mutex<FxHashMap<KeyTag, Arc<Slot>>>,
}

impl SoftwareKeyStore {
    #[must_use]
    pub fn new(strategy: CipherStrategy) -> Self {
        Self {
            strategy,
            random_iv: true,
            auth_validity: Duration::from_secs(DEFAULT_AUTH_VALIDITY_SECS),
            available: AtomicBool::new(true),
            next_slot: AtomicU64::new(1),
            generated: AtomicUsize::new(0),
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn symmetric() -> Self {
        Self::new(CipherStrategy::Symmetric)
    }

    #[must_use]
    pub fn asymmetric() -> Self {
        Self::new(CipherStrategy::Asymmetric)
    }

    #[must_use]
    pub fn from_config(config: &KeystoreConfig) -> Self {
        Self::new(config.strategy)
            .with_random_iv(config.random_iv)
            .with_auth_validity(config.auth_validity())
    }

    /// Disables per-write random IVs, emulating hardware limited to the fallback mode.
    #[must_use]
    pub const fn with_random_iv(mut self, enabled: bool) -> Self {
        self.random_iv = enabled;
        self
    }

    /// How long one authenticated context may be used.
    #[must_use]
    pub const fn with_auth_validity(mut self, validity: Duration) -> Self {
        self.auth_validity = validity;
        self
    }

    /// Switches the whole element off, making every call fail with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Keys generated over the lifetime of this element.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.slots.lock().len()
    }

    fn ensure_available(&self) -> Result<(), KeystoreError> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(KeystoreError::unavailable("secure element is switched off"))
        }
    }

    fn check_context(&self, ctx: &AuthContext) -> Result<(), KeystoreError> {
        if ctx.is_revoked() {
            return Err(KeystoreError::auth_required(format!(
                "authenticated context {} was invalidated",
                ctx.id()
            )));
        }
        if ctx.authenticated_at().elapsed() > self.auth_validity {
            return Err(KeystoreError::auth_required(format!(
                "authenticated context {} is older than {}s",
                ctx.id(),
                self.auth_validity.as_secs()
            )));
        }
        Ok(())
    }

    fn check_credential(
        expected: Option<&[u8; 32]>,
        ctx: &AuthContext,
    ) -> Result<(), KeystoreError> {
        let Some(expected) = expected else { return Ok(()) };
        match ctx.credential() {
            None => Err(KeystoreError::CredentialRejected {
                message: "application password required".into(),
                context: None,
            }),
            Some(given) if digest(given) == *expected => Ok(()),
            Some(_) => Err(KeystoreError::CredentialRejected {
                message: "application password does not match".into(),
                context: None,
            }),
        }
    }

    /// Resolves the live slot behind `key` and authorizes `ctx` against it.
    fn authorize(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Arc<Slot>, KeystoreError> {
        self.ensure_available()?;
        let slot = self
            .slots
            .lock()
            .get(key.tag())
            .filter(|slot| slot.id == key.slot())
            .cloned()
            .ok_or_else(|| {
                KeystoreError::unavailable(format!("key {} no longer exists", key.tag()))
            })?;

        self.check_context(ctx)?;
        Self::check_credential(slot.credential_digest.as_ref(), ctx)?;
        Ok(slot)
    }

    fn handle_for(&self, tag: &KeyTag, slot: &Slot) -> HardwareKeyHandle {
        let handle = HardwareKeyHandle::new(tag.clone(), self.strategy, slot.id);
        match &slot.material {
            Material::Ec(secret) => {
                handle.with_public_key(ecc::encode_public(&secret.public_key()))
            },
            Material::Aes(_) => handle,
        }
    }

    fn aes_key(slot: &Slot) -> Result<OuterCipher, KeystoreError> {
        match &slot.material {
            Material::Aes(key) => Ok(OuterCipher::new((&**key).into())),
            Material::Ec(_) => Err(KeystoreError::Unsupported {
                message: "symmetric sealing requested on an elliptic-curve key".into(),
                context: None,
            }),
        }
    }

    /// Fallback mode IV: fixed per key, derived from the slot identity.
    fn fixed_iv(slot: &Slot) -> [u8; OUTER_IV_LEN] {
        let hash = Sha256::new()
            .chain_update(b"svault.fixed-iv")
            .chain_update(slot.id.to_be_bytes())
            .finalize();
        let mut iv = [0u8; OUTER_IV_LEN];
        iv.copy_from_slice(&hash[..OUTER_IV_LEN]);
        iv
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

impl Default for SoftwareKeyStore {
    fn default() -> Self {
        Self::symmetric()
    }
}

impl fmt::Debug for SoftwareKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKeyStore")
            .field("strategy", &self.strategy)
            .field("random_iv", &self.random_iv)
            .field("auth_validity", &self.auth_validity)
            .field("available", &self.available.load(Ordering::Relaxed))
            .field("keys", &self.key_count())
            .finish_non_exhaustive()
    }
}

impl HardwareKeyStore for SoftwareKeyStore {
    fn strategy(&self) -> CipherStrategy {
        self.strategy
    }

    fn supports_random_iv(&self) -> bool {
        self.random_iv
    }

    fn find(&self, tag: &KeyTag) -> Result<Option<HardwareKeyHandle>, KeystoreError> {
        self.ensure_available()?;
        let slot = self.slots.lock().get(tag).cloned();
        Ok(slot.map(|slot| self.handle_for(tag, &slot)))
    }

    fn generate(
        &self,
        tag: &KeyTag,
        ctx: &AuthContext,
    ) -> Result<HardwareKeyHandle, KeystoreError> {
        self.ensure_available()?;
        self.check_context(ctx)?;

        let credential_digest = match tag.policy() {
            KeyPolicy::Standard => None,
            KeyPolicy::Paranoid => match ctx.credential() {
                Some(password) => Some(digest(password)),
                None => {
                    return Err(KeystoreError::CredentialRejected {
                        message: "paranoid keys need an application password".into(),
                        context: None,
                    });
                }
            },
        };

        let material = match self.strategy {
            CipherStrategy::Symmetric => {
                let mut key = Zeroizing::new([0u8; 32]);
                getrandom::fill(key.as_mut_slice())
                    .map_err(|e| KeystoreError::crypto(format!("OS RNG failed: {e}")))?;
                Material::Aes(key)
            }
            CipherStrategy::Asymmetric => Material::Ec(ecc::random_secret()?),
        };

        let slot = Arc::new(Slot {
            id: self.next_slot.fetch_add(1, Ordering::Relaxed),
            material,
            credential_digest,
        });

        let mut slots = self.slots.lock();
        if slots.contains_key(tag) {
            return Err(KeystoreError::unavailable(format!("key {tag} already exists")));
        }
        slots.insert(tag.clone(), slot.clone());
        drop(slots);

        self.generated.fetch_add(1, Ordering::AcqRel);
        debug!(tag = %tag, slot = slot.id, "Software key generated");
        Ok(self.handle_for(tag, &slot))
    }

    fn delete(&self, tag: &KeyTag) -> Result<bool, KeystoreError> {
        self.ensure_available()?;
        Ok(self.slots.lock().remove(tag).is_some())
    }

    fn seal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        plaintext: &[u8],
    ) -> Result<OuterSealed, KeystoreError> {
        let slot = self.authorize(key, ctx)?;
        let cipher = Self::aes_key(&slot)?;

        let (iv, prefix) = if self.random_iv {
            let mut iv = [0u8; OUTER_IV_LEN];
            getrandom::fill(&mut iv)
                .map_err(|e| KeystoreError::crypto(format!("OS RNG failed: {e}")))?;
            (iv, Some(iv))
        } else {
            (Self::fixed_iv(&slot), None)
        };

        let ciphertext = cipher
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext)
            .map_err(|_| KeystoreError::crypto("outer encryption failed"))?;

        Ok(OuterSealed { iv: prefix, ciphertext })
    }

    fn unseal(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        iv: Option<&[u8; OUTER_IV_LEN]>,
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let slot = self.authorize(key, ctx)?;
        let cipher = Self::aes_key(&slot)?;
        let iv = iv.copied().unwrap_or_else(|| Self::fixed_iv(&slot));

        cipher
            .decrypt(Nonce::<U16>::from_slice(&iv), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| KeystoreError::crypto("outer layer failed authentication"))
    }

    fn agree(
        &self,
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
        peer_public: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let slot = self.authorize(key, ctx)?;
        let Material::Ec(secret) = &slot.material else {
            return Err(KeystoreError::Unsupported {
                message: "key agreement requested on a symmetric key".into(),
                context: None,
            });
        };
        let peer = ecc::decode_public(peer_public)?;
        Ok(ecc::shared_secret(secret, &peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, advance};

    fn tag(policy: KeyPolicy) -> KeyTag {
        KeyTag::new("n1", policy)
    }

    fn fresh_ctx() -> AuthContext {
        AuthContext::new(1, Instant::now())
    }

    #[tokio::test(start_paused = true)]
    async fn seal_round_trips_with_random_iv() {
        let hw = SoftwareKeyStore::symmetric();
        let ctx = fresh_ctx();
        let key = hw.generate(&tag(KeyPolicy::Standard), &ctx).unwrap();

        let a = hw.seal(&key, &ctx, b"inner").unwrap();
        let b = hw.seal(&key, &ctx, b"inner").unwrap();
        assert!(a.iv.is_some());
        assert_ne!(a.ciphertext, b.ciphertext);

        let opened = hw.unseal(&key, &ctx, a.iv.as_ref(), &a.ciphertext).unwrap();
        assert_eq!(opened.as_slice(), b"inner");
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_mode_is_deterministic() {
        let hw = SoftwareKeyStore::symmetric().with_random_iv(false);
        let ctx = fresh_ctx();
        let key = hw.generate(&tag(KeyPolicy::Standard), &ctx).unwrap();

        let a = hw.seal(&key, &ctx, b"inner").unwrap();
        let b = hw.seal(&key, &ctx, b"inner").unwrap();
        assert_eq!(a, b);
        assert!(a.iv.is_none());
        assert_eq!(hw.unseal(&key, &ctx, None, &a.ciphertext).unwrap().as_slice(), b"inner");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_and_revoked_contexts_are_refused() {
        let hw = SoftwareKeyStore::symmetric().with_auth_validity(Duration::from_secs(5));
        let ctx = fresh_ctx();
        let key = hw.generate(&tag(KeyPolicy::Standard), &ctx).unwrap();

        advance(Duration::from_secs(6)).await;
        let err = hw.seal(&key, &ctx, b"x").unwrap_err();
        assert_eq!(err.kind(), "AuthenticationRequired");

        let renewed = fresh_ctx();
        assert!(hw.seal(&key, &renewed, b"x").is_ok());
        renewed.revoke();
        assert_eq!(hw.seal(&key, &renewed, b"x").unwrap_err().kind(), "AuthenticationRequired");
    }

    #[tokio::test(start_paused = true)]
    async fn paranoid_keys_check_the_application_password() {
        let hw = SoftwareKeyStore::symmetric();
        let bare = fresh_ctx();
        assert_eq!(
            hw.generate(&tag(KeyPolicy::Paranoid), &bare).unwrap_err().kind(),
            "CredentialRejected"
        );

        let ctx = fresh_ctx().with_credential(Zeroizing::new(b"pin-1234".to_vec()));
        let key = hw.generate(&tag(KeyPolicy::Paranoid), &ctx).unwrap();
        assert!(hw.seal(&key, &ctx, b"x").is_ok());

        let wrong = fresh_ctx().with_credential(Zeroizing::new(b"pin-0000".to_vec()));
        assert_eq!(hw.seal(&key, &wrong, b"x").unwrap_err().kind(), "CredentialRejected");
    }

    #[tokio::test(start_paused = true)]
    async fn asymmetric_keys_expose_only_the_public_half() {
        let hw = SoftwareKeyStore::asymmetric();
        let ctx = fresh_ctx();
        let key = hw.generate(&tag(KeyPolicy::Standard), &ctx).unwrap();
        assert_eq!(key.public_key().map(<[u8]>::len), Some(ecc::PUBLIC_KEY_LEN));

        let peer = ecc::random_secret().unwrap();
        let ours = hw.agree(&key, &ctx, &ecc::encode_public(&peer.public_key())).unwrap();
        let public = ecc::decode_public(key.public_key().unwrap()).unwrap();
        assert_eq!(ours.as_slice(), ecc::shared_secret(&peer, &public).as_slice());

        assert_eq!(hw.seal(&key, &ctx, b"x").unwrap_err().kind(), "Unsupported");
    }

    #[tokio::test(start_paused = true)]
    async fn handles_die_with_their_key() {
        let hw = SoftwareKeyStore::symmetric();
        let ctx = fresh_ctx();
        let t = tag(KeyPolicy::Standard);
        let old = hw.generate(&t, &ctx).unwrap();

        assert!(hw.delete(&t).unwrap());
        assert!(!hw.delete(&t).unwrap());
        let new = hw.generate(&t, &ctx).unwrap();
        assert_ne!(old.slot(), new.slot());
        assert_eq!(hw.seal(&old, &ctx, b"x").unwrap_err().kind(), "Unavailable");

        hw.set_available(false);
        assert_eq!(hw.find(&t).unwrap_err().kind(), "Unavailable");
    }
}
