mod fixtures;

use fixtures::{Compromised, Outcome, ScriptedPrompt, rig, rig_with};
use std::sync::Arc;
use std::time::Duration;
use svault::{SoftwareKeyStore, Vault, VaultError};

#[tokio::test]
async fn set_get_delete_cycle() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "k", "", "hello").await.unwrap();
    assert_eq!(rig.vault.get(&n1, "k", "").await.unwrap(), "hello");

    rig.vault.delete(&n1, "k").await.unwrap();
    let err = rig.vault.get(&n1, "k", "").await.unwrap_err();
    assert!(matches!(err, VaultError::EntryNotFound { .. }), "{err}");
}

#[tokio::test]
async fn overwrite_replaces_value() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "k", "", "first").await.unwrap();
    rig.vault.set(&n1, "k", "", "second").await.unwrap();
    assert_eq!(rig.vault.get(&n1, "k", "").await.unwrap(), "second");
}

#[tokio::test]
async fn empty_and_unicode_values_survive() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "empty", "", "").await.unwrap();
    rig.vault.set(&n1, "ключ", "pin", "значение 🔐").await.unwrap();
    assert_eq!(rig.vault.get(&n1, "empty", "").await.unwrap(), "");
    assert_eq!(rig.vault.get(&n1, "ключ", "pin").await.unwrap(), "значение 🔐");
}

#[tokio::test]
async fn never_written_entry_is_not_found() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    let err = rig.vault.get(&n1, "ghost", "").await.unwrap_err();
    assert_eq!(err.kind(), "EntryNotFound");

    rig.vault.set(&n1, "k", "", "v").await.unwrap();
    let err = rig.vault.get(&n1, "ghost", "").await.unwrap_err();
    assert_eq!(err.kind(), "EntryNotFound");
}

#[tokio::test]
async fn wrong_secret_is_reported() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "k", "s1", "v").await.unwrap();
    let err = rig.vault.get(&n1, "k", "s2").await.unwrap_err();
    assert!(matches!(err, VaultError::WrongSecretOrKey { .. }), "{err}");
    assert_eq!(rig.vault.get(&n1, "k", "s1").await.unwrap(), "v");
}

#[tokio::test]
async fn namespaces_do_not_share_entries() {
    let rig = rig().await;
    let a = rig.vault.namespace("a", false).unwrap();
    let b = rig.vault.namespace("b", false).unwrap();

    rig.vault.set(&a, "k", "", "in a").await.unwrap();
    assert_eq!(rig.vault.get(&b, "k", "").await.unwrap_err().kind(), "EntryNotFound");
    assert_eq!(rig.hw.key_count(), 1);
}

#[tokio::test]
async fn compromised_device_is_refused_before_anything_else() {
    let hw = Arc::new(SoftwareKeyStore::symmetric());
    let prompt = ScriptedPrompt::new(Outcome::Approve);
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::builder()
        .hardware(hw.clone())
        .prompt(prompt.clone())
        .integrity(Compromised("rooted"))
        .data_dir(dir.path())
        .connect()
        .await
        .unwrap();
    let n1 = vault.namespace("n1", false).unwrap();

    let err = vault.set(&n1, "k", "", "v").await.unwrap_err();
    assert!(matches!(err, VaultError::IntegrityFailed { ref message, .. } if message == "rooted"));
    assert_eq!(vault.get(&n1, "k", "").await.unwrap_err().kind(), "IntegrityFailed");
    assert_eq!(vault.delete(&n1, "k").await.unwrap_err().kind(), "IntegrityFailed");
    assert_eq!(vault.wipe(&n1).await.unwrap_err().kind(), "IntegrityFailed");

    assert_eq!(hw.generated_count(), 0);
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn zero_window_prompts_on_every_call() {
    let rig = rig_with(Arc::new(SoftwareKeyStore::symmetric()), Duration::ZERO).await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "k", "", "v").await.unwrap();
    rig.vault.get(&n1, "k", "").await.unwrap();
    rig.vault.get(&n1, "k", "").await.unwrap();
    assert_eq!(rig.prompt.calls(), 3);
}

#[tokio::test]
async fn cached_authentication_is_reused() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    rig.vault.set(&n1, "k", "", "v").await.unwrap();
    rig.vault.get(&n1, "k", "").await.unwrap();
    rig.vault.delete(&n1, "k").await.unwrap();
    assert_eq!(rig.prompt.calls(), 1);
}

#[tokio::test]
async fn deleting_missing_entry_fails() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();

    assert_eq!(rig.vault.delete(&n1, "k").await.unwrap_err().kind(), "EntryNotFound");
    rig.vault.set(&n1, "other", "", "v").await.unwrap();
    assert_eq!(rig.vault.delete(&n1, "k").await.unwrap_err().kind(), "EntryNotFound");
}

#[tokio::test]
async fn wipe_removes_entries_and_keys() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();
    let keep = rig.vault.namespace("keep", false).unwrap();

    rig.vault.set(&n1, "a", "", "1").await.unwrap();
    rig.vault.set(&n1, "b", "", "2").await.unwrap();
    rig.vault.set(&keep, "a", "", "3").await.unwrap();
    assert_eq!(rig.hw.key_count(), 2);

    rig.vault.wipe(&n1).await.unwrap();
    assert_eq!(rig.hw.key_count(), 1);
    assert_eq!(rig.vault.get(&n1, "a", "").await.unwrap_err().kind(), "EntryNotFound");
    assert_eq!(rig.vault.get(&keep, "a", "").await.unwrap(), "3");

    rig.vault.wipe(&n1).await.unwrap();
}

#[tokio::test]
async fn wipe_reports_unavailable_hardware() {
    let rig = rig().await;
    let n1 = rig.vault.namespace("n1", false).unwrap();
    rig.vault.set(&n1, "a", "", "1").await.unwrap();

    rig.hw.set_available(false);
    let err = rig.vault.wipe(&n1).await.unwrap_err();
    assert!(matches!(err, VaultError::HardwareKeyUnavailable { .. }), "{err}");
}

#[tokio::test]
async fn invalid_namespace_names_are_rejected() {
    let rig = rig().await;
    assert_eq!(rig.vault.namespace("../etc", false).unwrap_err().kind(), "Internal");
    assert_eq!(rig.vault.namespace("", false).unwrap_err().kind(), "Internal");
}
