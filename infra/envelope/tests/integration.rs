pub mod fixtures;

use fixtures::{entry, rig};
use std::time::Duration;
use svault_domain::{AuthContext, CipherStrategy, KeyPolicy, KeyTag};
use svault_envelope::{EnvelopeEngine, EnvelopeError};
use svault_keystore::{HardwareKeyStore, KeystoreError, SoftwareKeyStore};
use tokio::time::{Instant, advance};
use zeroize::Zeroizing;

#[test]
fn tampering_is_detected_at_either_layer() {
    let r = rig(CipherStrategy::Symmetric, true);
    let k = entry("k");
    let record = r.engine.encrypt(&k, b"pw", b"payload", &r.key, &r.ctx).unwrap();

    for at in [0, 20, record.len() - 1] {
        let mut bad = record.clone();
        bad[at] ^= 0x01;
        let err = r.engine.decrypt(&k, b"pw", &bad, &r.key, &r.ctx).unwrap_err();
        assert!(matches!(err, EnvelopeError::WrongSecretOrKey { .. }), "byte {at}: {err}");
    }
}

#[test]
fn records_die_with_the_hardware_key() {
    let r = rig(CipherStrategy::Symmetric, true);
    let k = entry("k");
    let record = r.engine.encrypt(&k, b"", b"payload", &r.key, &r.ctx).unwrap();

    let tag = r.key.tag().clone();
    assert!(r.hw.delete(&tag).unwrap());
    let fresh = r.hw.generate(&tag, &r.ctx).unwrap();

    let err = r.engine.decrypt(&k, b"", &record, &fresh, &r.ctx).unwrap_err();
    assert_eq!(err.kind(), "WrongSecretOrKey");

    // The old handle no longer resolves to anything.
    let err = r.engine.decrypt(&k, b"", &record, &r.key, &r.ctx).unwrap_err();
    assert!(matches!(
        err,
        EnvelopeError::Hardware { source: KeystoreError::Unavailable { .. }, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn stale_context_asks_for_authentication() {
    let hw = std::sync::Arc::new(
        SoftwareKeyStore::symmetric().with_auth_validity(Duration::from_secs(5)),
    );
    let ctx = AuthContext::new(1, Instant::now());
    let key = hw.generate(&KeyTag::new("n1", KeyPolicy::Standard), &ctx).unwrap();
    let engine = EnvelopeEngine::new(hw);
    let k = entry("k");
    let record = engine.encrypt(&k, b"", b"payload", &key, &ctx).unwrap();

    advance(Duration::from_secs(6)).await;
    let err = engine.decrypt(&k, b"", &record, &key, &ctx).unwrap_err();
    assert!(err.requires_authentication());
    assert!(engine.encrypt(&k, b"", b"x", &key, &ctx).unwrap_err().requires_authentication());

    let renewed = AuthContext::new(2, Instant::now());
    assert_eq!(engine.decrypt(&k, b"", &record, &key, &renewed).unwrap().as_slice(), b"payload");
}

#[test]
fn paranoid_key_rejects_a_different_password() {
    let hw = std::sync::Arc::new(SoftwareKeyStore::asymmetric());
    let ctx = AuthContext::new(1, Instant::now())
        .with_credential(Zeroizing::new(b"app-password".to_vec()));
    let key = hw.generate(&KeyTag::new("n1", KeyPolicy::Paranoid), &ctx).unwrap();
    let engine = EnvelopeEngine::new(hw);
    let k = entry("k");

    // Sealing needs only the public half.
    let record = engine.encrypt(&k, b"", b"payload", &key, &ctx).unwrap();

    let intruder = AuthContext::new(2, Instant::now())
        .with_credential(Zeroizing::new(b"guess".to_vec()));
    let err = engine.decrypt(&k, b"", &record, &key, &intruder).unwrap_err();
    assert!(matches!(
        err,
        EnvelopeError::Hardware { source: KeystoreError::CredentialRejected { .. }, .. }
    ));
    assert_eq!(engine.decrypt(&k, b"", &record, &key, &ctx).unwrap().as_slice(), b"payload");
}
