use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use svault_session::{AuthSession, AuthenticationPrompt, PromptError};
use tokio::sync::Notify;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Outcome {
    Approve,
    Deny,
    Cancel,
    /// Never resolves on its own.
    Hang,
}

/// Prompt double that counts calls and answers from a script.
#[derive(Debug)]
pub struct ScriptedPrompt {
    outcome: Mutex<Outcome>,
    password: Mutex<Option<Vec<u8>>>,
    calls: AtomicUsize,
    password_calls: AtomicUsize,
    reasons: Mutex<Vec<String>>,
    pub started: Notify,
}

#[allow(dead_code)]
impl ScriptedPrompt {
    #[must_use]
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            password: Mutex::new(None),
            calls: AtomicUsize::new(0),
            password_calls: AtomicUsize::new(0),
            reasons: Mutex::new(Vec::new()),
            started: Notify::new(),
        })
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn set_password(&self, password: &[u8]) {
        *self.password.lock() = Some(password.to_vec());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn password_calls(&self) -> usize {
        self.password_calls.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().clone()
    }
}

#[async_trait]
impl AuthenticationPrompt for ScriptedPrompt {
    async fn evaluate(&self, reason: &str) -> Result<(), PromptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reasons.lock().push(reason.to_owned());
        let outcome = *self.outcome.lock();
        self.started.notify_one();
        match outcome {
            Outcome::Approve => Ok(()),
            Outcome::Deny => Err(PromptError::Platform {
                message: "biometry not recognised".into(),
                context: None,
            }),
            Outcome::Cancel => {
                Err(PromptError::Cancelled { message: "user tapped cancel".into(), context: None })
            },
            Outcome::Hang => std::future::pending().await,
        }
    }

    async fn request_application_password(
        &self,
        _reason: &str,
    ) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        self.password_calls.fetch_add(1, Ordering::SeqCst);
        let password = self.password.lock().clone();
        password.map(Zeroizing::new).ok_or_else(|| PromptError::Cancelled {
            message: "no password entered".into(),
            context: None,
        })
    }
}

/// Session with a 10 second window over a scripted prompt.
#[must_use]
pub fn session(prompt: &Arc<ScriptedPrompt>) -> AuthSession {
    AuthSession::builder()
        .prompt(prompt.clone())
        .invalidate_after(std::time::Duration::from_secs(10))
        .build()
}
