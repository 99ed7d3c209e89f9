//! Core record store: sandbox root, namespace views, and the atomic write path.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::namespace::NamespacedStorage;
use crate::security;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Shared state behind a [`Storage`] handle.
#[derive(Debug)]
pub struct StorageInner {
    /// Canonical physical root; every namespace is a directory directly below it.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// Handle to the sandboxed record store.
///
/// Every record lives in `<root>/<namespace>/<path>` and is replaced atomically: a reader
/// sees either the previous bytes or the new ones, never a torn write. The handle is
/// reference-counted and cheap to clone.
///
/// ```rust
/// use svault_storage::{Storage, StorageError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let storage = Storage::builder().root(tmp.path().join("vault")).connect().await?;
///
///     let wallet = storage.namespace("wallet")?;
///     wallet.write("records/9f2c", b"ciphertext").await?;
///     assert_eq!(wallet.read("records/9f2c").await?, b"ciphertext");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a view scoped to one namespace directory.
    ///
    /// # Errors
    /// Returns [`StorageError::PathTraversalAttempt`] if `name` is not a portable directory name.
    pub fn namespace(&self, name: &str) -> Result<NamespacedStorage, StorageError> {
        security::check_namespace(name)?;
        Ok(NamespacedStorage::new(self.clone(), name.to_owned()))
    }

    /// Sweeps stale temp files under the whole root. Runs automatically on connect.
    pub async fn purge_tmp(&self) -> usize {
        maintenance::purge_tmp(&self.root).await
    }

    pub(crate) fn resolve_in(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, StorageError> {
        security::resolve_path(&self.root, namespace, path)
    }

    pub(crate) async fn read_in(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve_in(namespace, path)?;

        match fs::read(&resolved).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(not_found(&resolved)),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", resolved.display()).into()),
            }),
        }
    }

    /// Atomic swap: unique temp file, `fsync`, rename over the target, then sync the directory.
    pub(crate) async fn write_in(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_in(namespace, path)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directory for {}", resolved.display()))?;
        }

        let temp = self.tmp_path(&resolved);
        if let Err(err) = write_synced(&temp, data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err);
        }

        if let Err(err) = swap_into_place(&temp, &resolved).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err);
        }

        if let Some(parent) = resolved.parent() {
            sync_dir(parent).await;
        }

        debug!(namespace, bytes = data.len(), "Record saved atomically");
        Ok(())
    }

    pub(crate) async fn delete_in(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_in(namespace, path)?;

        match fs::remove_file(&resolved).await {
            Ok(()) => {
                if let Some(parent) = resolved.parent() {
                    sync_dir(parent).await;
                }
                debug!(namespace, "Record deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(not_found(&resolved)),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to delete: {}", resolved.display()).into()),
            }),
        }
    }

    /// Removes the whole namespace directory. `Ok(false)` when it never existed.
    pub(crate) async fn purge_in(&self, namespace: &str) -> Result<bool, StorageError> {
        security::check_namespace(namespace)?;
        let dir = self.root.join(namespace);

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                sync_dir(&self.root).await;
                debug!(namespace, "Namespace directory purged");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to purge namespace {namespace}").into()),
            }),
        }
    }

    fn tmp_path(&self, target: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("record");
        target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{n}", std::process::id()))
    }
}

async fn write_synced(temp: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp)
        .await
        .context(format!("Temp creation failed: {}", temp.display()))?;
    file.write_all(data).await.context("Write failed")?;
    file.sync_all().await.context("Hardware sync failed")?;
    Ok(())
}

async fn swap_into_place(temp: &Path, target: &Path) -> Result<(), StorageError> {
    match fs::rename(temp, target).await {
        Ok(()) => Ok(()),
        // Platforms without replace-on-rename
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(target)
                .await
                .context(format!("Failed to replace existing file: {}", target.display()))?;
            fs::rename(temp, target).await.context(format!(
                "Atomic swap failed: {} -> {}",
                temp.display(),
                target.display()
            ))
        }
        Err(err) => Err(StorageError::Io {
            source: err,
            context: Some(
                format!("Atomic swap failed: {} -> {}", temp.display(), target.display()).into(),
            ),
        }),
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        }
        Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
    }
}

fn not_found(path: &Path) -> StorageError {
    StorageError::RecordNotFound { message: path.display().to_string().into(), context: None }
}
