//! # Vault Errors
//!
//! [`VaultError`] is the only error callers of the vault see. Lower layers are folded into
//! its seven kinds here, at the boundary.

use std::borrow::Cow;
use svault_domain::DomainError;
use svault_envelope::EnvelopeError;
use svault_keystore::KeystoreError;
use svault_session::{CredentialFailure, SessionError};
use svault_storage::StorageError;

#[svault_derive::svault_error]
pub enum VaultError {
    /// The device integrity oracle returned a non-pass verdict.
    #[error("Device integrity check failed{}: {message}", format_context(.context))]
    IntegrityFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The hardware still demands a fresh authenticated context after the single retry.
    #[error("Authentication required{}: {message}", format_context(.context))]
    AuthenticationRequired { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Authentication cancelled{}: {message}", format_context(.context))]
    AuthenticationCancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Decryption did not verify. Possibly a wrong secret, possibly tampering.
    #[error("Wrong secret or key{}: {message}", format_context(.context))]
    WrongSecretOrKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Entry not found{}: {message}", format_context(.context))]
    EntryNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Secure hardware could not create, find or delete a key.
    #[error("Hardware key unavailable{}: {message}", format_context(.context))]
    HardwareKeyUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    pub(crate) fn entry_not_found() -> Self {
        Self::EntryNotFound { message: "no entry under this identifier".into(), context: None }
    }

    /// Carries the display form of `err` as the message, keeping no reference to `err`.
    fn internal(err: &impl std::error::Error) -> Self {
        Self::Internal { message: err.to_string().into(), context: None }
    }
}

impl CredentialFailure for VaultError {
    fn rejects_credential(&self) -> bool {
        matches!(self, Self::WrongSecretOrKey { .. })
    }
}

impl From<KeystoreError> for VaultError {
    fn from(err: KeystoreError) -> Self {
        match err {
            KeystoreError::AuthenticationRequired { message, context } => {
                Self::AuthenticationRequired { message, context }
            },
            KeystoreError::CredentialRejected { message, context }
            | KeystoreError::Crypto { message, context } => {
                Self::WrongSecretOrKey { message, context }
            },
            KeystoreError::Unavailable { message, context } => {
                Self::HardwareKeyUnavailable { message, context }
            },
            other => Self::internal(&other),
        }
    }
}

impl From<EnvelopeError> for VaultError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::WrongSecretOrKey { message, context }
            | EnvelopeError::InvalidRecord { message, context } => {
                Self::WrongSecretOrKey { message, context }
            },
            EnvelopeError::Hardware { source, .. } => source.into(),
            other => Self::internal(&other),
        }
    }
}

impl From<StorageError> for VaultError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RecordNotFound { .. } => Self::entry_not_found(),
            other => Self::internal(&other),
        }
    }
}

impl From<SessionError> for VaultError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Cancelled { message, context } => {
                Self::AuthenticationCancelled { message, context }
            },
            SessionError::Platform { message, context }
            | SessionError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}

impl From<DomainError> for VaultError {
    fn from(err: DomainError) -> Self {
        Self::internal(&err)
    }
}
