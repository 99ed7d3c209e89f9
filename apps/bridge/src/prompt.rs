use async_trait::async_trait;
use clap::ValueEnum;
use svault::{AuthenticationPrompt, PromptError};
use tracing::info;
use zeroize::Zeroizing;

/// How the bridge answers authentication prompts on hosts without biometry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptMode {
    #[default]
    Approve,
    Deny,
    Cancel,
}

/// Prompt provider answering every request the same way.
#[derive(Debug)]
pub struct FixedPrompt {
    mode: PromptMode,
    password: Option<Zeroizing<Vec<u8>>>,
}

impl FixedPrompt {
    #[must_use]
    pub const fn new(mode: PromptMode) -> Self {
        Self { mode, password: None }
    }

    /// Application password handed out for paranoid namespaces.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }
}

#[async_trait]
impl AuthenticationPrompt for FixedPrompt {
    async fn evaluate(&self, reason: &str) -> Result<(), PromptError> {
        info!(mode = ?self.mode, reason, "Authentication requested");
        match self.mode {
            PromptMode::Approve => Ok(()),
            PromptMode::Deny => Err(PromptError::Platform {
                message: "authentication denied by host policy".into(),
                context: None,
            }),
            PromptMode::Cancel => Err(PromptError::Cancelled {
                message: "authentication cancelled by host policy".into(),
                context: None,
            }),
        }
    }

    async fn request_application_password(
        &self,
        _reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        self.password.clone().ok_or_else(|| PromptError::Cancelled {
            message: "no application password configured".into(),
            context: None,
        })
    }
}
