use crate::constants::{
    DEFAULT_AUTH_REASON, DEFAULT_AUTH_VALIDITY_SECS, DEFAULT_INVALIDATE_AFTER_SECS,
};
use crate::namespace::CipherStrategy;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level vault configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfigInner {
    pub session: SessionConfig,
    pub keystore: KeystoreConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(flatten, default)]
    inner: Arc<VaultConfigInner>,
}

impl Deref for VaultConfig {
    type Target = VaultConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for VaultConfig {
    fn deref_mut(&mut self) -> &mut VaultConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Seeds for the authentication session; all three stay mutable at runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub invalidate_after_secs: u64,
    pub automatic: bool,
    pub reason: String,
}

impl SessionConfig {
    #[must_use]
    pub const fn invalidate_after(&self) -> Duration {
        Duration::from_secs(self.invalidate_after_secs)
    }
}

/// Secure-element emulation knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    pub strategy: CipherStrategy,
    pub random_iv: bool,
    pub auth_validity_secs: u64,
}

impl KeystoreConfig {
    #[must_use]
    pub const fn auth_validity(&self) -> Duration {
        Duration::from_secs(self.auth_validity_secs)
    }
}

/// Where namespace record directories live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub directory: Option<PathBuf>,
}

// --- Default ---

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            invalidate_after_secs: DEFAULT_INVALIDATE_AFTER_SECS,
            automatic: false,
            reason: DEFAULT_AUTH_REASON.to_owned(),
        }
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            strategy: CipherStrategy::Symmetric,
            random_iv: true,
            auth_validity_secs: DEFAULT_AUTH_VALIDITY_SECS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./vault-data") }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false, directory: None }
    }
}
