//! # Keystore
//!
//! Hardware-backed key handling for the vault.
//!
//! * [`HardwareKeyStore`]: capability interface to secure hardware, in a symmetric and an
//!   asymmetric flavour selected by [`CipherStrategy`](svault_domain::CipherStrategy).
//! * [`SoftwareKeyStore`]: an in-process secure-element emulation.
//! * [`KeyLifecycleManager`]: single-flight `ensure`/`fetch`/`drop` per key tag.
//!
//! ```rust
//! use std::sync::Arc;
//! use svault_domain::{AuthContext, Namespace};
//! use svault_keystore::{KeyLifecycleManager, SoftwareKeyStore};
//!
//! let keys = KeyLifecycleManager::new(Arc::new(SoftwareKeyStore::symmetric()));
//! let ctx = AuthContext::new(1, tokio::time::Instant::now());
//! let tag = Namespace::new("wallet", false).unwrap().key_tag();
//!
//! let first = keys.ensure_key(&tag, &ctx).unwrap();
//! let again = keys.ensure_key(&tag, &ctx).unwrap();
//! assert_eq!(first, again);
//! assert!(keys.drop_key(&tag));
//! ```

pub mod ecc;
mod error;
mod hardware;
mod manager;
mod software;

pub use error::{KeystoreError, KeystoreErrorExt};
pub use hardware::{HardwareKeyHandle, HardwareKeyStore, OUTER_IV_LEN, OuterSealed};
pub use manager::KeyLifecycleManager;
pub use software::SoftwareKeyStore;
