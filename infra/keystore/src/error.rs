use std::borrow::Cow;

#[svault_derive::svault_error]
pub enum KeystoreError {
    /// The authenticated context is absent, revoked or older than the hardware accepts.
    #[error("Authentication required{}: {message}", format_context(.context))]
    AuthenticationRequired { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The second factor bound to the context does not match the key.
    #[error("Credential rejected{}: {message}", format_context(.context))]
    CredentialRejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Secure hardware refused or failed the request.
    #[error("Secure hardware unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported key operation{}: {message}", format_context(.context))]
    Unsupported { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An AEAD tag or key agreement failed inside the hardware boundary.
    #[error("Cryptographic failure{}: {message}", format_context(.context))]
    Crypto { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal keystore error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl KeystoreError {
    pub(crate) fn auth_required(message: impl Into<Cow<'static, str>>) -> Self {
        Self::AuthenticationRequired { message: message.into(), context: None }
    }

    pub(crate) fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unavailable { message: message.into(), context: None }
    }

    pub(crate) fn crypto(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Crypto { message: message.into(), context: None }
    }
}
