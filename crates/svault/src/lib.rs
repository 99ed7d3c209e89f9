//! Facade of the secure vault.
//! Composes the hardware key lifecycle, the envelope cipher, the authentication session and
//! the record store behind [`Vault`]. Keep this crate thin: policy lives here, mechanisms
//! live in the layer crates.
//!
//! ## Usage
//! - Build a [`Vault`] with [`Vault::builder`], handing it the secure hardware and the
//!   platform prompt.
//! - Obtain a [`Namespace`](domain::Namespace) per logical keychain and call
//!   `set`/`get`/`delete`/`wipe` on it.
//! - Drive [`AuthSession`] from application lifecycle events (`on_background`,
//!   `on_foreground`).

mod builder;
pub mod config;
mod error;
mod integrity;
mod vault;

pub use svault_domain as domain;

pub use builder::{NoHardware, NoPrompt, VaultBuilder, WithHardware, WithPrompt};
pub use error::{VaultError, VaultErrorExt};
pub use integrity::{AlwaysPass, IntegrityOracle, IntegrityVerdict};
pub use svault_keystore::{HardwareKeyStore, SoftwareKeyStore};
pub use svault_session::{AuthSession, AuthenticationPrompt, PromptError, SessionState};
pub use vault::{MAX_AUTH_RETRIES, Vault, VaultInner};

pub mod prelude {
    pub use crate::domain::{CipherStrategy, KeyPolicy, Namespace};
    pub use crate::{
        AuthSession, AuthenticationPrompt, HardwareKeyStore, IntegrityOracle, IntegrityVerdict,
        PromptError, SoftwareKeyStore, Vault, VaultError,
    };
}
