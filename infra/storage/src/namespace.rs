use crate::engine::Storage;
use crate::error::StorageError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A view of the store scoped to `<root>/<namespace>`.
///
/// Paths are relative to the namespace directory; `..` can never climb out of it.
/// Cloning is cheap: the view only holds the shared engine handle and the name.
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: Arc<str>,
}

impl NamespacedStorage {
    pub(crate) fn new(storage: Storage, namespace: String) -> Self {
        Self { storage, namespace: Arc::from(namespace) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.namespace
    }

    /// Physical location of `path`.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] if `path` escapes the namespace.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        self.storage.resolve_in(&self.namespace, path)
    }

    /// # Errors
    /// [`StorageError::RecordNotFound`] if nothing is stored at `path`.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.storage.read_in(&self.namespace, path).await
    }

    /// Replace-or-nothing write; intermediate directories are created on demand.
    ///
    /// # Errors
    /// [`StorageError::Io`] when the disk refuses the write; the previous record is untouched.
    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_in(&self.namespace, path, data).await
    }

    /// # Errors
    /// [`StorageError::RecordNotFound`] if nothing is stored at `path`.
    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        self.storage.delete_in(&self.namespace, path).await
    }

    /// # Errors
    /// Fails only on traversal attempts or unreadable metadata.
    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::try_exists(&resolved).await.map_err(|source| StorageError::Io {
            source,
            context: Some(format!("Failed to stat {}", resolved.display()).into()),
        })
    }

    /// Deletes every record of the namespace. Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    /// [`StorageError::Io`] if the directory cannot be removed.
    pub async fn purge(&self) -> Result<bool, StorageError> {
        self.storage.purge_in(&self.namespace).await
    }
}
