use crate::builder::VaultBuilder;
use crate::error::VaultError;
use crate::integrity::{IntegrityOracle, IntegrityVerdict};
use std::ops::Deref;
use std::sync::Arc;
use svault_domain::constants::SALT_LEN;
use svault_domain::{AuthContext, KeyPolicy, KeyTag, Namespace};
use svault_envelope::{EntryDigest, EnvelopeEngine, Salt, new_salt};
use svault_keystore::KeyLifecycleManager;
use svault_session::AuthSession;
use svault_storage::{NamespacedStorage, Storage, StorageError};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// How often an operation is re-run after the hardware asked for fresh authentication.
pub const MAX_AUTH_RETRIES: usize = 1;

const SALT_FILE: &str = "salt";
const RECORDS_DIR: &str = "records";

#[derive(Debug)]
pub struct VaultInner {
    pub(crate) keys: KeyLifecycleManager,
    pub(crate) engine: EnvelopeEngine,
    pub(crate) session: AuthSession,
    pub(crate) storage: Storage,
    pub(crate) integrity: Arc<dyn IntegrityOracle>,
}

/// Secure vault for small string secrets.
///
/// Every call first consults the integrity oracle, then runs inside the authentication
/// session, uses the hardware key of the namespace and delegates to the envelope engine.
/// When the hardware rejects a context mid-operation, the session is invalidated and the
/// operation re-runs once after re-authentication. Decrypted values are never cached.
///
/// ```rust
/// use svault::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), VaultError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// # #[derive(Debug)] struct Approve;
/// # #[async_trait::async_trait]
/// # impl AuthenticationPrompt for Approve {
/// #     async fn evaluate(&self, _: &str) -> Result<(), PromptError> { Ok(()) }
/// # }
/// let vault = Vault::builder()
///     .hardware(SoftwareKeyStore::symmetric())
///     .prompt(Approve)
///     .data_dir(tmp.path())
///     .connect()
///     .await?;
///
/// let notes = vault.namespace("notes", false)?;
/// vault.set(&notes, "groceries", "", "milk").await?;
/// assert_eq!(vault.get(&notes, "groceries", "").await?, "milk");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Vault {
    pub(crate) inner: Arc<VaultInner>,
}

impl Deref for Vault {
    type Target = VaultInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Vault {
    #[must_use = "The vault is not created until you call .connect()"]
    pub fn builder() -> VaultBuilder {
        VaultBuilder::new()
    }

    /// Validates a namespace name and pairs it with its access policy.
    ///
    /// # Errors
    /// [`VaultError::Internal`] for names that cannot be used as a record directory.
    pub fn namespace(&self, name: &str, paranoia: bool) -> Result<Namespace, VaultError> {
        Ok(Namespace::new(name, paranoia)?)
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub async fn is_device_secure(&self) -> bool {
        self.integrity.is_device_secure().await
    }

    /// Stores `value` under `entry_id`, replacing any previous value.
    ///
    /// # Errors
    /// Any [`VaultError`] kind except `EntryNotFound`. A failed write leaves the previous
    /// record in place.
    pub async fn set(
        &self,
        namespace: &Namespace,
        entry_id: &str,
        secret: &str,
        value: &str,
    ) -> Result<(), VaultError> {
        self.check_integrity().await?;
        let records = self.storage.namespace(namespace.name())?;

        self.with_authentication(namespace, |ctx| {
            let records = records.clone();
            async move {
                let salt = self
                    .load_salt(&records, true)
                    .await?
                    .ok_or_else(VaultError::entry_not_found)?;
                let entry = EntryDigest::new(&salt, entry_id);
                let tag = namespace.key_tag();
                let secret = Zeroizing::new(secret.as_bytes().to_vec());
                let value = Zeroizing::new(value.as_bytes().to_vec());

                let (record, entry) = self
                    .blocking(move |vault| {
                        let key = vault.keys.ensure_key(&tag, &ctx)?;
                        let record = vault.engine.encrypt(&entry, &secret, &value, &key, &ctx)?;
                        Ok((record, entry))
                    })
                    .await?;

                records.write(record_path(&entry), &record).await?;
                debug!(namespace = %namespace, entry = %entry, "Entry stored");
                Ok(())
            }
        })
        .await
    }

    /// Reads the value stored under `entry_id`.
    ///
    /// # Errors
    /// * [`VaultError::EntryNotFound`] if nothing was ever stored there.
    /// * [`VaultError::WrongSecretOrKey`] if `secret` (or the key) does not open the record.
    /// * Any other kind from authentication or hardware.
    pub async fn get(
        &self,
        namespace: &Namespace,
        entry_id: &str,
        secret: &str,
    ) -> Result<String, VaultError> {
        self.check_integrity().await?;
        let records = self.storage.namespace(namespace.name())?;

        self.with_authentication(namespace, |ctx| {
            let records = records.clone();
            async move {
                let salt = self
                    .load_salt(&records, false)
                    .await?
                    .ok_or_else(VaultError::entry_not_found)?;
                let entry = EntryDigest::new(&salt, entry_id);
                let record = records.read(record_path(&entry)).await?;
                let tag = namespace.key_tag();
                let secret = Zeroizing::new(secret.as_bytes().to_vec());

                let plaintext = self
                    .blocking(move |vault| {
                        let key = vault.keys.fetch_key(&tag, Some(&ctx))?;
                        Ok(vault.engine.decrypt(&entry, &secret, &record, &key, &ctx)?)
                    })
                    .await?;

                String::from_utf8(plaintext.to_vec())
                    .map_err(|_| VaultError::from("stored value is not valid UTF-8"))
            }
        })
        .await
    }

    /// Removes the entry.
    ///
    /// # Errors
    /// [`VaultError::EntryNotFound`] if there is nothing to remove.
    pub async fn delete(&self, namespace: &Namespace, entry_id: &str) -> Result<(), VaultError> {
        self.check_integrity().await?;
        let records = self.storage.namespace(namespace.name())?;

        self.with_authentication(namespace, |_ctx| {
            let records = records.clone();
            async move {
                let salt = self
                    .load_salt(&records, false)
                    .await?
                    .ok_or_else(VaultError::entry_not_found)?;
                let entry = EntryDigest::new(&salt, entry_id);
                records.delete(record_path(&entry)).await?;
                debug!(namespace = %namespace, entry = %entry, "Entry deleted");
                Ok(())
            }
        })
        .await
    }

    /// Deletes every entry and the salt of the namespace, then both of its hardware keys.
    ///
    /// # Errors
    /// [`VaultError::HardwareKeyUnavailable`] if the hardware refused to drop a key; the
    /// records are gone by then.
    pub async fn wipe(&self, namespace: &Namespace) -> Result<(), VaultError> {
        self.check_integrity().await?;
        let records = self.storage.namespace(namespace.name())?;

        self.with_authentication(namespace, |_ctx| {
            let records = records.clone();
            async move {
                let purged = records.purge().await?;
                let name = Arc::<str>::from(namespace.name());
                let dropped = self
                    .blocking(move |vault| {
                        Ok(KeyPolicy::ALL
                            .iter()
                            .map(|policy| vault.keys.drop_key(&KeyTag::new(name.clone(), *policy)))
                            .fold(true, |all, ok| all && ok))
                    })
                    .await?;

                if !dropped {
                    return Err(VaultError::HardwareKeyUnavailable {
                        message: format!("hardware refused to drop the keys of {namespace}").into(),
                        context: None,
                    });
                }
                info!(namespace = %namespace, purged, "Namespace wiped");
                Ok(())
            }
        })
        .await
    }

    async fn check_integrity(&self) -> Result<(), VaultError> {
        match self.integrity.assess().await {
            IntegrityVerdict::Pass => Ok(()),
            IntegrityVerdict::Fail(reason) => {
                warn!(reason = %reason, "Device integrity check failed");
                Err(VaultError::IntegrityFailed { message: reason.into(), context: None })
            },
        }
    }

    /// Runs `op` in the session, re-running it at most [`MAX_AUTH_RETRIES`] times after the
    /// hardware reports that the context is no longer good enough.
    async fn with_authentication<T, F, Fut>(
        &self,
        namespace: &Namespace,
        op: F,
    ) -> Result<T, VaultError>
    where
        F: Fn(AuthContext) -> Fut,
        Fut: Future<Output = Result<T, VaultError>>,
    {
        let mut retries = 0;
        loop {
            match self.session.use_context(namespace.policy(), &op).await {
                Err(VaultError::AuthenticationRequired { message, .. })
                    if retries < MAX_AUTH_RETRIES =>
                {
                    retries += 1;
                    warn!(
                        namespace = %namespace,
                        reason = %message,
                        "Re-authenticating after hardware refusal"
                    );
                    self.session.invalidate(true).await?;
                },
                outcome => return outcome,
            }
        }
    }

    /// Loads the namespace salt, creating it when `create` is set and none exists yet.
    async fn load_salt(
        &self,
        records: &NamespacedStorage,
        create: bool,
    ) -> Result<Option<Salt>, VaultError> {
        match records.read(SALT_FILE).await {
            Ok(bytes) => Salt::try_from(bytes.as_slice()).map(Some).map_err(|_| {
                VaultError::from(format!("salt of {} is not {SALT_LEN} bytes", records.name()))
            }),
            Err(StorageError::RecordNotFound { .. }) if create => {
                let salt = new_salt()?;
                records.write(SALT_FILE, &salt).await?;
                info!(namespace = records.name(), "Namespace salt created");
                Ok(Some(salt))
            },
            Err(StorageError::RecordNotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Runs keystore and cipher work off the async executor.
    async fn blocking<T, F>(&self, work: F) -> Result<T, VaultError>
    where
        F: FnOnce(&VaultInner) -> Result<T, VaultError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&inner))
            .await
            .map_err(|e| VaultError::from(format!("blocking task failed: {e}")))?
    }
}

fn record_path(entry: &EntryDigest) -> String {
    format!("{RECORDS_DIR}/{}", entry.storage_key())
}
