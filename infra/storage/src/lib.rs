//! Sandboxed record store backing the vault.
//!
//! # Core Features
//!
//! - **Sandbox Security**: namespace names are restricted to portable directory names and
//!   record paths are resolved against the canonical root, so neither `..` nor symlinks can
//!   reach outside it.
//! - **Atomic Writes**: unique temp file + `fsync` + `rename` + directory sync. A crash leaves
//!   the old record or the new one, never a mix.
//! - **Self-Healing**: temp files orphaned by interrupted writes are swept on connect.
//!
//! # Layout
//!
//! 1. **[`Storage`]**: the thread-safe handle created by [`StorageBuilder`].
//! 2. **[`NamespacedStorage`]**: a view over `<root>/<namespace>`, purged as a whole on wipe.

mod builder;
mod engine;
mod error;
mod maintenance;
mod namespace;
mod security;

pub use builder::StorageBuilder;
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
pub use namespace::NamespacedStorage;
