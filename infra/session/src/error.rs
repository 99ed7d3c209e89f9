use crate::prompt::PromptError;
use std::borrow::Cow;

#[svault_derive::svault_error]
pub enum SessionError {
    /// Authentication was cancelled; the session state did not change.
    #[error("Authentication cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The platform prompt failed for any other reason. The message is the platform's own.
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Platform { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal session error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Lets the session tell a refused application password apart from other failures of a
/// paranoid operation.
pub trait CredentialFailure {
    fn rejects_credential(&self) -> bool;
}

impl CredentialFailure for SessionError {
    fn rejects_credential(&self) -> bool {
        false
    }
}

impl SessionError {
    pub(crate) fn cancelled(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled { message: message.into(), context: None }
    }
}

impl From<PromptError> for SessionError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled { message, context } => Self::Cancelled { message, context },
            PromptError::Platform { message, context } => Self::Platform { message, context },
        }
    }
}
