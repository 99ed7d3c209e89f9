use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Outcome of a platform prompt that did not succeed.
#[svault_derive::svault_error]
pub enum PromptError {
    /// The user (or the caller) dismissed the prompt.
    #[error("Prompt cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Biometry locked out, no passcode set, wrong fingerprint, and the like.
    #[error("Platform authentication error{}: {message}", format_context(.context))]
    Platform { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// The platform's modal authentication dialog.
///
/// The vault never renders UI itself; it only calls these methods and consumes the result.
#[async_trait]
pub trait AuthenticationPrompt: Send + Sync + fmt::Debug {
    /// Asks the user to pass a biometric or passcode challenge.
    ///
    /// # Errors
    /// [`PromptError::Cancelled`] when dismissed, [`PromptError::Platform`] otherwise.
    async fn evaluate(&self, reason: &str) -> Result<(), PromptError>;

    /// Asks for the application password bound to paranoid keys.
    ///
    /// # Errors
    /// As for [`evaluate`](Self::evaluate). Platforms without such a dialog keep the default,
    /// which always fails with [`PromptError::Platform`].
    async fn request_application_password(
        &self,
        reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        let _ = reason;
        Err(PromptError::Platform {
            message: "application password entry is not supported".into(),
            context: None,
        })
    }
}

#[async_trait]
impl<T> AuthenticationPrompt for Arc<T>
where
    T: AuthenticationPrompt + ?Sized,
{
    async fn evaluate(&self, reason: &str) -> Result<(), PromptError> {
        (**self).evaluate(reason).await
    }

    async fn request_application_password(
        &self,
        reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        (**self).request_application_password(reason).await
    }
}

#[async_trait]
impl<T> AuthenticationPrompt for Box<T>
where
    T: AuthenticationPrompt + ?Sized,
{
    async fn evaluate(&self, reason: &str) -> Result<(), PromptError> {
        (**self).evaluate(reason).await
    }

    async fn request_application_password(
        &self,
        reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        (**self).request_application_password(reason).await
    }
}
