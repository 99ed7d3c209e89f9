use std::sync::Arc;
use svault_domain::{AuthContext, CipherStrategy, KeyPolicy, KeyTag};
use svault_envelope::{EntryDigest, EnvelopeEngine};
use svault_keystore::{HardwareKeyHandle, HardwareKeyStore, SoftwareKeyStore};
use tokio::time::Instant;

pub const SALT: [u8; 32] = [7u8; 32];

/// Everything needed to seal and open records for one key.
#[allow(dead_code)]
pub struct Rig {
    pub hw: Arc<SoftwareKeyStore>,
    pub engine: EnvelopeEngine,
    pub key: HardwareKeyHandle,
    pub ctx: AuthContext,
}

/// Builds an engine over a fresh software element with one standard key for `"n1"`.
/// # Panics
/// * If the software element refuses to generate the key.
#[must_use]
pub fn rig(strategy: CipherStrategy, random_iv: bool) -> Rig {
    let hw = Arc::new(SoftwareKeyStore::new(strategy).with_random_iv(random_iv));
    let ctx = AuthContext::new(1, Instant::now());
    let key = hw.generate(&KeyTag::new("n1", KeyPolicy::Standard), &ctx).expect("key generation");
    let engine = EnvelopeEngine::new(hw.clone());
    Rig { hw, engine, key, ctx }
}

#[must_use]
pub fn entry(id: &str) -> EntryDigest {
    EntryDigest::new(&SALT, id)
}
