use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use svault::{AuthenticationPrompt, IntegrityOracle, IntegrityVerdict, PromptError, Vault};
use svault_domain::{AuthContext, CipherStrategy, KeyTag};
use svault_keystore::{
    HardwareKeyHandle, HardwareKeyStore, KeystoreError, OUTER_IV_LEN, OuterSealed,
    SoftwareKeyStore,
};
use tempfile::TempDir;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Outcome {
    Approve,
    Deny,
    Cancel,
}

/// Prompt double: answers from a script and counts how often the user was asked.
#[derive(Debug)]
pub struct ScriptedPrompt {
    outcome: Mutex<Outcome>,
    password: Mutex<Option<Vec<u8>>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedPrompt {
    #[must_use]
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            password: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn set_password(&self, password: &str) {
        *self.password.lock() = Some(password.as_bytes().to_vec());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticationPrompt for ScriptedPrompt {
    async fn evaluate(&self, _reason: &str) -> Result<(), PromptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.outcome.lock() {
            Outcome::Approve => Ok(()),
            Outcome::Deny => Err(PromptError::Platform {
                message: "biometry not recognised".into(),
                context: None,
            }),
            Outcome::Cancel => {
                Err(PromptError::Cancelled { message: "user tapped cancel".into(), context: None })
            },
        }
    }

    async fn request_application_password(
        &self,
        _reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        let password = self.password.lock().clone();
        password.map(Zeroizing::new).ok_or_else(|| PromptError::Cancelled {
            message: "no password entered".into(),
            context: None,
        })
    }
}

/// Oracle reporting a compromised device.
#[derive(Debug)]
pub struct Compromised(pub &'static str);

#[async_trait]
impl IntegrityOracle for Compromised {
    async fn assess(&self) -> IntegrityVerdict {
        IntegrityVerdict::Fail(self.0.to_owned())
    }
}

/// Hardware that manages keys normally but rejects every context when asked to use one.
#[derive(Debug)]
pub struct AlwaysStale(pub Arc<SoftwareKeyStore>);

impl HardwareKeyStore for AlwaysStale {
    fn strategy(&self) -> CipherStrategy {
        self.0.strategy()
    }

    fn supports_random_iv(&self) -> bool {
        self.0.supports_random_iv()
    }

    fn find(&self, tag: &KeyTag) -> Result<Option<HardwareKeyHandle>, KeystoreError> {
        self.0.find(tag)
    }

    fn generate(
        &self,
        tag: &KeyTag,
        ctx: &AuthContext,
    ) -> Result<HardwareKeyHandle, KeystoreError> {
        self.0.generate(tag, ctx)
    }

    fn delete(&self, tag: &KeyTag) -> Result<bool, KeystoreError> {
        self.0.delete(tag)
    }

    fn seal(
        &self,
        _key: &HardwareKeyHandle,
        _ctx: &AuthContext,
        _plaintext: &[u8],
    ) -> Result<OuterSealed, KeystoreError> {
        Err(stale())
    }

    fn unseal(
        &self,
        _key: &HardwareKeyHandle,
        _ctx: &AuthContext,
        _iv: Option<&[u8; OUTER_IV_LEN]>,
        _ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        Err(stale())
    }

    fn agree(
        &self,
        _key: &HardwareKeyHandle,
        _ctx: &AuthContext,
        _peer_public: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        Err(stale())
    }
}

fn stale() -> KeystoreError {
    KeystoreError::AuthenticationRequired {
        message: "context no longer accepted".into(),
        context: None,
    }
}

/// A vault over a software element and a scratch directory.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Rig {
    pub vault: Vault,
    pub hw: Arc<SoftwareKeyStore>,
    pub prompt: Arc<ScriptedPrompt>,
    pub dir: TempDir,
}

/// Symmetric vault with a one minute session window and an approving prompt.
/// # Panics
/// * If the scratch directory or the record store cannot be created.
#[allow(dead_code)]
pub async fn rig() -> Rig {
    rig_with(Arc::new(SoftwareKeyStore::symmetric()), Duration::from_secs(60)).await
}

/// # Panics
/// * If the scratch directory or the record store cannot be created.
pub async fn rig_with(hw: Arc<SoftwareKeyStore>, window: Duration) -> Rig {
    let dir = tempfile::tempdir().expect("temp dir");
    let prompt = ScriptedPrompt::new(Outcome::Approve);
    let vault = Vault::builder()
        .hardware(hw.clone())
        .prompt(prompt.clone())
        .data_dir(dir.path())
        .invalidate_after(window)
        .connect()
        .await
        .expect("vault connect");
    Rig { vault, hw, prompt, dir }
}
