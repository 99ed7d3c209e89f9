//! P-256 helpers shared by the secure element and the asymmetric envelope.

use crate::error::KeystoreError;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

/// Uncompressed SEC1 point: `0x04 || X || Y`.
pub const PUBLIC_KEY_LEN: usize = 65;

/// Scalars at or above the group order are rejected; redraws are vanishingly rare.
const MAX_DRAWS: usize = 8;

/// Draws a fresh secret key from the OS RNG.
///
/// # Errors
/// [`KeystoreError::Crypto`] if the RNG fails.
pub fn random_secret() -> Result<SecretKey, KeystoreError> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    for _ in 0..MAX_DRAWS {
        getrandom::fill(bytes.as_mut_slice())
            .map_err(|e| KeystoreError::crypto(format!("OS RNG failed: {e}")))?;
        if let Ok(secret) = SecretKey::from_slice(bytes.as_slice()) {
            return Ok(secret);
        }
    }
    Err(KeystoreError::crypto("could not draw a valid P-256 scalar"))
}

#[must_use]
pub fn encode_public(public: &PublicKey) -> Vec<u8> {
    public.to_encoded_point(false).as_bytes().to_vec()
}

/// # Errors
/// [`KeystoreError::Crypto`] if `bytes` is not a point on the curve.
pub fn decode_public(bytes: &[u8]) -> Result<PublicKey, KeystoreError> {
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| KeystoreError::crypto("malformed P-256 public key"))
}

/// Raw ECDH shared secret (`x` coordinate of the product point).
#[must_use]
pub fn shared_secret(secret: &SecretKey, peer: &PublicKey) -> Zeroizing<Vec<u8>> {
    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    Zeroizing::new(shared.raw_secret_bytes().to_vec())
}
