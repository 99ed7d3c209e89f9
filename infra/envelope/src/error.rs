//! # Envelope Errors
//!
//! Absence of a record is not an envelope concern; everything here means the bytes were
//! there but could not be opened.

use std::borrow::Cow;
use svault_keystore::KeystoreError;

#[svault_derive::svault_error]
pub enum EnvelopeError {
    /// An AEAD tag did not verify: wrong secret, replaced hardware key or tampered bytes.
    #[error("Wrong secret or key{}: {message}", format_context(.context))]
    WrongSecretOrKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The record is too short or otherwise not laid out as this engine writes it.
    #[error("Invalid record{}: {message}", format_context(.context))]
    InvalidRecord { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Secure hardware refused the operation.
    #[error("Hardware failure{}: {source}", format_context(.context))]
    Hardware { source: KeystoreError, context: Option<Cow<'static, str>> },

    #[error("Internal envelope error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl EnvelopeError {
    /// `true` when the hardware asked for a fresh authenticated context.
    #[must_use]
    pub const fn requires_authentication(&self) -> bool {
        matches!(self, Self::Hardware { source: KeystoreError::AuthenticationRequired { .. }, .. })
    }

    pub(crate) fn wrong_key(message: impl Into<Cow<'static, str>>) -> Self {
        Self::WrongSecretOrKey { message: message.into(), context: None }
    }

    pub(crate) fn invalid_record(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidRecord { message: message.into(), context: None }
    }

    /// Tag failures inside the hardware are reported as a wrong key; the rest pass through.
    pub(crate) fn from_hardware(source: KeystoreError) -> Self {
        match source {
            KeystoreError::Crypto { message, context } => {
                Self::WrongSecretOrKey { message, context }
            }
            source => Self::Hardware { source, context: None },
        }
    }
}
