use crate::error::BridgeError;
use crate::protocol::Command;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::time::Duration;
use svault::{Vault, VaultError};
use svault::domain::Namespace;
use tracing::debug;

/// Maps bridge commands onto vault operations, one namespace handle per `initialize`.
#[derive(Debug)]
pub struct Dispatcher {
    vault: Vault,
    namespaces: RwLock<FxHashMap<String, Namespace>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(vault: Vault) -> Self {
        Self { vault, namespaces: RwLock::new(FxHashMap::default()) }
    }

    #[must_use]
    pub const fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Runs one command and returns the reply value.
    ///
    /// # Errors
    /// Vault failures as [`BridgeError::Vault`], commands on unknown namespaces as
    /// [`BridgeError::NotInitialized`].
    pub async fn dispatch(&self, command: Command) -> Result<Value, BridgeError> {
        debug!(command = command.name(), "Dispatching");
        let session = self.vault.session();

        match command {
            Command::Initialize { namespace, paranoia } => {
                let handle = self.vault.namespace(&namespace, paranoia)?;
                self.namespaces.write().insert(namespace, handle);
                Ok(Value::Null)
            },
            Command::SetItem { namespace, key, value, secret } => {
                let ns = self.lookup(&namespace)?;
                self.vault.set(&ns, &key, &secret, &value).await?;
                Ok(Value::Null)
            },
            Command::GetItem { namespace, key, secret } => {
                let ns = self.lookup(&namespace)?;
                Ok(Value::String(self.vault.get(&ns, &key, &secret).await?))
            },
            Command::RemoveItem { namespace, key } => {
                let ns = self.lookup(&namespace)?;
                self.vault.delete(&ns, &key).await?;
                Ok(Value::Null)
            },
            Command::RemoveAll { namespace } => {
                let ns = self.lookup(&namespace)?;
                self.vault.wipe(&ns).await?;
                Ok(Value::Null)
            },
            Command::IsDeviceSecure => Ok(Value::Bool(self.vault.is_device_secure().await)),
            Command::Authenticate { reason } => {
                session.authenticate(reason.as_deref()).await.map_err(VaultError::from)?;
                Ok(Value::Null)
            },
            Command::SetInvalidationTimeout { seconds } => {
                session.set_invalidate_after(Duration::from_secs(seconds)).await;
                Ok(Value::Null)
            },
            Command::Invalidate => {
                let discarded = session.invalidate(true).await.map_err(VaultError::from)?;
                Ok(Value::Bool(discarded))
            },
            Command::ToggleAutomaticAuthentication { enabled } => {
                session.set_automatic(enabled);
                Ok(Value::Null)
            },
            Command::SetAuthenticationReason { reason } => {
                session.set_reason(reason);
                Ok(Value::Null)
            },
            Command::Foreground => {
                session.on_foreground().await.map_err(VaultError::from)?;
                Ok(Value::Null)
            },
            Command::Background => {
                session.on_background().await.map_err(VaultError::from)?;
                Ok(Value::Null)
            },
        }
    }

    fn lookup(&self, namespace: &str) -> Result<Namespace, BridgeError> {
        self.namespaces.read().get(namespace).cloned().ok_or_else(|| {
            BridgeError::NotInitialized {
                message: format!("call initialize for '{namespace}' first").into(),
                context: None,
            }
        })
    }
}
