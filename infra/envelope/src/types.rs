use crate::error::EnvelopeError;
use aes_gcm::AesGcm;
use aes_gcm::aead::consts::U16;
use aes_gcm::aes::{Aes128, Aes256};
use sha2::{Digest, Sha256};
use std::fmt;
use svault_domain::constants::SALT_LEN;
use zeroize::Zeroizing;

// --- Ciphers ---

/// Inner layer of the symmetric envelope: AES-256-GCM with a 16-byte IV.
pub(crate) type InnerCipher = AesGcm<Aes256, U16>;

/// Symmetric half of the asymmetric envelope (P-256 pairs with a 128-bit AES key).
pub(crate) type EciesCipher = AesGcm<Aes128, U16>;

// --- Record layout constants ---

/// IV length used by both layers.
pub const IV_LEN: usize = 16;

/// GCM tag length.
pub const TAG_LEN: usize = 16;

pub(crate) const ECIES_KEY_LEN: usize = 16;

/// Per-namespace salt.
pub type Salt = [u8; SALT_LEN];

/// Draws a fresh namespace salt from the OS RNG.
///
/// # Errors
/// [`EnvelopeError::Internal`] if the RNG fails.
pub fn new_salt() -> Result<Salt, EnvelopeError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt).map_err(|e| format!("OS RNG failed: {e}"))?;
    Ok(salt)
}

/// `SHA-256(salt || entryId)`.
///
/// Both the storage key of an entry and the inner IV of its envelope come from this value,
/// so entry identifiers themselves are never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub struct EntryDigest([u8; 32]);

impl EntryDigest {
    #[must_use]
    pub fn new(salt: &[u8], entry_id: impl AsRef<[u8]>) -> Self {
        Self(Sha256::new().chain_update(salt).chain_update(entry_id).finalize().into())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fixed-width lowercase hex name under which the record is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        hex::encode(self.0)
    }

    /// Deterministic inner IV: the first 16 bytes of the digest.
    #[must_use]
    pub fn inner_iv(&self) -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.0[..IV_LEN]);
        iv
    }

    /// Inner key: `SHA-256(secret || digest)`.
    pub(crate) fn inner_key(&self, secret: &[u8]) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(Sha256::new().chain_update(secret).chain_update(self.0).finalize().into())
    }
}

impl fmt::Debug for EntryDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryDigest").field(&self.storage_key()).finish()
    }
}

impl fmt::Display for EntryDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
