use aes_gcm::Nonce;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use svault_domain::{AuthContext, CipherStrategy};
use svault_keystore::{HardwareKeyHandle, HardwareKeyStore, ecc};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::EnvelopeError;
use crate::types::{ECIES_KEY_LEN, EciesCipher, EntryDigest, IV_LEN, InnerCipher, TAG_LEN};

#[derive(Debug)]
pub(crate) struct EnvelopeInner {
    store: Arc<dyn HardwareKeyStore>,
    strategy: CipherStrategy,
    random_iv: bool,
}

/// Turns plaintext into ciphertext records and back.
///
/// The strategy is fixed by the hardware the engine is built on, never chosen per call.
///
/// ### Symmetric record
/// ```text
/// [OUTER_IV(16)?][OUTER_CT( INNER_CT(N) || INNER_TAG(16) )][OUTER_TAG(16)]
/// ```
/// The outer IV is present only when the hardware supports random IVs.
/// The inner layer uses the key `SHA-256(secret || digest)` and the IV `digest[..16]`, where
/// `digest = SHA-256(salt || entryId)`. The inner IV repeats on every write of an entry;
/// the outer hardware layer draws a fresh IV per write and re-randomizes the record.
///
/// ### Asymmetric record
/// ```text
/// [EPHEMERAL_PUBLIC_KEY(65)][CT(N)][TAG(16)]
/// ```
/// ECIES over P-256 with the X9.63 SHA-256 KDF and AES-128-GCM. The caller secret plays no
/// part; only the hardware private key can open the record.
#[derive(Debug, Clone)]
pub struct EnvelopeEngine {
    inner: Arc<EnvelopeInner>,
}

impl EnvelopeEngine {
    #[must_use]
    pub fn new(store: Arc<dyn HardwareKeyStore>) -> Self {
        let strategy = store.strategy();
        let random_iv = store.supports_random_iv();
        Self { inner: Arc::new(EnvelopeInner { store, strategy, random_iv }) }
    }

    #[must_use]
    pub fn strategy(&self) -> CipherStrategy {
        self.inner.strategy
    }

    /// Whether symmetric records carry an outer IV prefix.
    #[must_use]
    pub fn random_iv(&self) -> bool {
        self.inner.random_iv
    }

    /// Encrypts `plaintext` for the entry behind `entry`.
    ///
    /// # Errors
    /// * [`EnvelopeError::Hardware`] when the hardware refuses `key` under `ctx`.
    /// * [`EnvelopeError::Internal`] when a cipher cannot be set up.
    pub fn encrypt(
        &self,
        entry: &EntryDigest,
        secret: &[u8],
        plaintext: &[u8],
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let record = match self.inner.strategy {
            CipherStrategy::Symmetric => self.seal_symmetric(entry, secret, plaintext, key, ctx)?,
            CipherStrategy::Asymmetric => Self::seal_asymmetric(plaintext, key)?,
        };
        debug!(
            entry = %entry,
            strategy = ?self.inner.strategy,
            len = record.len(),
            "Envelope sealed"
        );
        Ok(record)
    }

    /// Opens a record written by [`encrypt`](Self::encrypt). Both AEAD layers are verified
    /// before anything is returned.
    ///
    /// # Errors
    /// * [`EnvelopeError::WrongSecretOrKey`] when any tag fails to verify.
    /// * [`EnvelopeError::InvalidRecord`] when the record is too short.
    /// * [`EnvelopeError::Hardware`] when the hardware refuses `key` under `ctx`.
    pub fn decrypt(
        &self,
        entry: &EntryDigest,
        secret: &[u8],
        record: &[u8],
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        let plaintext = match self.inner.strategy {
            CipherStrategy::Symmetric => self.open_symmetric(entry, secret, record, key, ctx)?,
            CipherStrategy::Asymmetric => self.open_asymmetric(record, key, ctx)?,
        };
        debug!(entry = %entry, strategy = ?self.inner.strategy, "Envelope opened");
        Ok(plaintext)
    }

    fn seal_symmetric(
        &self,
        entry: &EntryDigest,
        secret: &[u8],
        plaintext: &[u8],
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let inner = inner_cipher(entry, secret)?
            .encrypt(Nonce::<U16>::from_slice(&entry.inner_iv()), plaintext)
            .map_err(|_| EnvelopeError::from("inner layer encryption failed"))?;

        let outer =
            self.inner.store.seal(key, ctx, &inner).map_err(EnvelopeError::from_hardware)?;

        let mut record = Vec::with_capacity(IV_LEN + outer.ciphertext.len());
        match (self.inner.random_iv, outer.iv) {
            (true, Some(iv)) => record.extend_from_slice(&iv),
            (false, None) => {}
            _ => return Err("hardware IV mode disagrees with the engine".into()),
        }
        record.extend_from_slice(&outer.ciphertext);
        Ok(record)
    }

    fn open_symmetric(
        &self,
        entry: &EntryDigest,
        secret: &[u8],
        record: &[u8],
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        let (iv, outer) = if self.inner.random_iv {
            let (iv, rest) = record
                .split_first_chunk::<IV_LEN>()
                .ok_or_else(|| EnvelopeError::invalid_record("missing outer IV"))?;
            (Some(iv), rest)
        } else {
            (None, record)
        };
        if outer.len() < 2 * TAG_LEN {
            return Err(EnvelopeError::invalid_record("record shorter than two tags"));
        }

        let inner =
            self.inner.store.unseal(key, ctx, iv, outer).map_err(EnvelopeError::from_hardware)?;

        inner_cipher(entry, secret)?
            .decrypt(Nonce::<U16>::from_slice(&entry.inner_iv()), inner.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| EnvelopeError::wrong_key("inner layer did not verify"))
    }

    fn seal_asymmetric(
        plaintext: &[u8],
        key: &HardwareKeyHandle,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let recipient = key
            .public_key()
            .ok_or_else(|| EnvelopeError::from("asymmetric key has no public half"))?;
        let recipient =
            ecc::decode_public(recipient).map_err(|e| EnvelopeError::from(e.to_string()))?;

        let ephemeral = ecc::random_secret().map_err(EnvelopeError::from_hardware)?;
        let ephemeral_public = ecc::encode_public(&ephemeral.public_key());
        let shared = ecc::shared_secret(&ephemeral, &recipient);

        let body = ecies_cipher(&shared, &ephemeral_public)?
            .encrypt(Nonce::<U16>::from_slice(&[0u8; IV_LEN]), plaintext)
            .map_err(|_| EnvelopeError::from("ECIES encryption failed"))?;

        let mut record = ephemeral_public;
        record.extend_from_slice(&body);
        Ok(record)
    }

    fn open_asymmetric(
        &self,
        record: &[u8],
        key: &HardwareKeyHandle,
        ctx: &AuthContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        if record.len() < ecc::PUBLIC_KEY_LEN + TAG_LEN {
            return Err(EnvelopeError::invalid_record("record shorter than key and tag"));
        }
        let (ephemeral_public, body) = record.split_at(ecc::PUBLIC_KEY_LEN);

        let shared = self
            .inner
            .store
            .agree(key, ctx, ephemeral_public)
            .map_err(EnvelopeError::from_hardware)?;

        ecies_cipher(&shared, ephemeral_public)?
            .decrypt(Nonce::<U16>::from_slice(&[0u8; IV_LEN]), body)
            .map(Zeroizing::new)
            .map_err(|_| EnvelopeError::wrong_key("ECIES tag did not verify"))
    }
}

fn inner_cipher(entry: &EntryDigest, secret: &[u8]) -> Result<InnerCipher, EnvelopeError> {
    let key = entry.inner_key(secret);
    InnerCipher::new_from_slice(key.as_slice())
        .map_err(|_| EnvelopeError::from("inner key has the wrong length"))
}

/// ANSI X9.63 KDF with SHA-256, one block: `SHA-256(Z || 00000001 || ephemeralPublicKey)`.
/// The IV is all zeros; every record has its own ephemeral key and so its own AES key.
fn ecies_cipher(shared: &[u8], ephemeral_public: &[u8]) -> Result<EciesCipher, EnvelopeError> {
    let block = Zeroizing::new(<[u8; 32]>::from(
        Sha256::new()
            .chain_update(shared)
            .chain_update(1u32.to_be_bytes())
            .chain_update(ephemeral_public)
            .finalize(),
    ));
    EciesCipher::new_from_slice(&block[..ECIES_KEY_LEN])
        .map_err(|_| EnvelopeError::from("ECIES key has the wrong length"))
}
