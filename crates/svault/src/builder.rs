use crate::error::VaultError;
use crate::integrity::{AlwaysPass, IntegrityOracle};
use crate::vault::{Vault, VaultInner};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use svault_domain::config::{SessionConfig, StorageConfig, VaultConfig};
use svault_envelope::EnvelopeEngine;
use svault_keystore::{HardwareKeyStore, KeyLifecycleManager};
use svault_session::{AuthSession, AuthenticationPrompt};
use svault_storage::Storage;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoHardware;
#[derive(Debug)]
pub struct WithHardware(Arc<dyn HardwareKeyStore>);

#[derive(Debug, Default)]
pub struct NoPrompt;
#[derive(Debug)]
pub struct WithPrompt(Arc<dyn AuthenticationPrompt>);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoHardware {}
impl Sealed for WithHardware {}
impl Sealed for NoPrompt {}
impl Sealed for WithPrompt {}

/// Assembles a [`Vault`]. Both the hardware and the prompt are mandatory; everything else
/// has a default.
#[allow(private_bounds)]
#[derive(Debug)]
pub struct VaultBuilder<H: Sealed = NoHardware, P: Sealed = NoPrompt> {
    hardware: H,
    prompt: P,
    session: SessionConfig,
    data_dir: PathBuf,
    storage: Option<Storage>,
    integrity: Arc<dyn IntegrityOracle>,
}

impl Default for VaultBuilder<NoHardware, NoPrompt> {
    fn default() -> Self {
        Self {
            hardware: NoHardware,
            prompt: NoPrompt,
            session: SessionConfig::default(),
            data_dir: StorageConfig::default().data_dir,
            storage: None,
            integrity: Arc::new(AlwaysPass),
        }
    }
}

impl VaultBuilder<NoHardware, NoPrompt> {
    #[must_use = "Creates a new vault builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(private_bounds)]
impl<H: Sealed, P: Sealed> VaultBuilder<H, P> {
    /// Seeds the session settings and the data directory from configuration.
    #[must_use = "Applies the vault configuration"]
    pub fn config(mut self, config: &VaultConfig) -> Self {
        self.session = config.session.clone();
        self.data_dir.clone_from(&config.storage.data_dir);
        self
    }

    #[must_use = "Sets the directory namespace records are stored under"]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Uses an already opened record store; `data_dir` is ignored then.
    #[must_use = "Sets an existing record store"]
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use = "Sets the device integrity oracle consulted before every operation"]
    pub fn integrity(mut self, oracle: impl IntegrityOracle + 'static) -> Self {
        self.integrity = Arc::new(oracle);
        self
    }

    #[must_use = "Sets how long a cached authentication stays valid"]
    pub fn invalidate_after(mut self, window: Duration) -> Self {
        self.session.invalidate_after_secs = window.as_secs();
        self
    }

    #[must_use = "Sets whether lifecycle events authenticate and invalidate eagerly"]
    pub const fn automatic(mut self, enabled: bool) -> Self {
        self.session.automatic = enabled;
        self
    }

    #[must_use = "Sets the text shown by the platform prompt"]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.session.reason = reason.into();
        self
    }
}

#[allow(private_bounds)]
impl<P: Sealed> VaultBuilder<NoHardware, P> {
    #[must_use = "Sets the secure hardware keys are created in"]
    pub fn hardware(self, store: impl HardwareKeyStore + 'static) -> VaultBuilder<WithHardware, P> {
        VaultBuilder {
            hardware: WithHardware(Arc::new(store)),
            prompt: self.prompt,
            session: self.session,
            data_dir: self.data_dir,
            storage: self.storage,
            integrity: self.integrity,
        }
    }
}

#[allow(private_bounds)]
impl<H: Sealed> VaultBuilder<H, NoPrompt> {
    #[must_use = "Sets the platform prompt the session authenticates with"]
    pub fn prompt(
        self,
        prompt: impl AuthenticationPrompt + 'static,
    ) -> VaultBuilder<H, WithPrompt> {
        VaultBuilder {
            hardware: self.hardware,
            prompt: WithPrompt(Arc::new(prompt)),
            session: self.session,
            data_dir: self.data_dir,
            storage: self.storage,
            integrity: self.integrity,
        }
    }
}

impl VaultBuilder<WithHardware, WithPrompt> {
    /// Opens the record store and wires the layers together.
    ///
    /// No key is created and no prompt is shown here; both happen on first use.
    ///
    /// # Errors
    /// [`VaultError::Internal`] if the data directory cannot be created or resolved.
    pub async fn connect(self) -> Result<Vault, VaultError> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => Storage::builder().root(self.data_dir).connect().await?,
        };

        let store = self.hardware.0;
        let engine = EnvelopeEngine::new(Arc::clone(&store));
        let session = AuthSession::builder().config(&self.session).prompt(self.prompt.0).build();

        info!(
            strategy = ?engine.strategy(),
            random_iv = engine.random_iv(),
            root = %storage.root().display(),
            "Vault ready"
        );

        Ok(Vault {
            inner: Arc::new(VaultInner {
                keys: KeyLifecycleManager::new(store),
                engine,
                session,
                storage,
                integrity: self.integrity,
            }),
        })
    }
}
