//! Envelope cipher engine for the vault.
//!
//! Two interchangeable strategies, picked from the capabilities of the
//! [`HardwareKeyStore`](svault_keystore::HardwareKeyStore) the engine is built on:
//!
//! * **Symmetric double envelope**: a secret-derived inner AES-GCM layer wrapped by an outer
//!   layer sealed inside secure hardware.
//! * **Asymmetric hardware envelope**: ECIES to the public half of a hardware P-256 key;
//!   opening requires the hardware private-key operation under an authenticated context.
//!
//! ## Deterministic Inner IV
//!
//! The inner IV is `SHA-256(salt || entryId)[..16]` and therefore repeats on every write of
//! the same entry. This is the storage format: changing it would orphan existing records.
//! With random outer IVs the record as a whole is still fresh on each write; in the fallback
//! mode (no random IV support) identical writes produce identical records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use svault_domain::{AuthContext, KeyTag, KeyPolicy};
//! use svault_envelope::{EntryDigest, EnvelopeEngine, new_salt};
//! use svault_keystore::{HardwareKeyStore, SoftwareKeyStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hw = Arc::new(SoftwareKeyStore::symmetric());
//! let ctx = AuthContext::new(1, tokio::time::Instant::now());
//! let key = hw.generate(&KeyTag::new("notes", KeyPolicy::Standard), &ctx)?;
//!
//! let engine = EnvelopeEngine::new(hw);
//! let entry = EntryDigest::new(&new_salt()?, "shopping-list");
//!
//! let record = engine.encrypt(&entry, b"pw", b"milk", &key, &ctx)?;
//! let plain = engine.decrypt(&entry, b"pw", &record, &key, &ctx)?;
//! assert_eq!(plain.as_slice(), b"milk");
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod types;

pub use engine::EnvelopeEngine;
pub use error::{EnvelopeError, EnvelopeErrorExt};
pub use types::{EntryDigest, IV_LEN, Salt, TAG_LEN, new_salt};
