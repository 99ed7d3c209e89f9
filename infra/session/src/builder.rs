use crate::lane::Lane;
use crate::prompt::AuthenticationPrompt;
use crate::session::{AuthSession, SessionInner};
use private::Sealed;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use svault_domain::config::SessionConfig;
use svault_domain::constants::{DEFAULT_AUTH_REASON, DEFAULT_INVALIDATE_AFTER_SECS};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct NoPrompt;
#[derive(Debug)]
pub struct WithPrompt(Arc<dyn AuthenticationPrompt>);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoPrompt {}
impl Sealed for WithPrompt {}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct SessionBuilder<S: Sealed = NoPrompt> {
    state: S,
    invalidate_after: Duration,
    automatic: bool,
    reason: Arc<str>,
}

impl Default for SessionBuilder<NoPrompt> {
    fn default() -> Self {
        Self {
            state: NoPrompt,
            invalidate_after: Duration::from_secs(DEFAULT_INVALIDATE_AFTER_SECS),
            automatic: false,
            reason: Arc::from(DEFAULT_AUTH_REASON),
        }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> SessionBuilder<S> {
    #[must_use = "Sets how long a cached authentication stays valid"]
    pub const fn invalidate_after(mut self, window: Duration) -> Self {
        self.invalidate_after = window;
        self
    }

    #[must_use = "Sets whether lifecycle events authenticate and invalidate eagerly"]
    pub const fn automatic(mut self, enabled: bool) -> Self {
        self.automatic = enabled;
        self
    }

    #[must_use = "Sets the text shown by the platform prompt"]
    pub fn reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Seeds window, automatic mode and reason from configuration.
    #[must_use = "Applies the session configuration"]
    pub fn config(self, config: &SessionConfig) -> Self {
        self.invalidate_after(config.invalidate_after())
            .automatic(config.automatic)
            .reason(config.reason.as_str())
    }
}

impl SessionBuilder<NoPrompt> {
    #[must_use = "Creates a new session builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the platform prompt the session authenticates with"]
    pub fn prompt(self, prompt: impl AuthenticationPrompt + 'static) -> SessionBuilder<WithPrompt> {
        SessionBuilder {
            state: WithPrompt(Arc::new(prompt)),
            invalidate_after: self.invalidate_after,
            automatic: self.automatic,
            reason: self.reason,
        }
    }
}

impl SessionBuilder<WithPrompt> {
    #[must_use]
    pub fn build(self) -> AuthSession {
        AuthSession {
            inner: Arc::new(SessionInner {
                prompt: self.state.0,
                lane: Lane::new(self.invalidate_after),
                automatic: AtomicBool::new(self.automatic),
                reason: parking_lot::RwLock::new(self.reason),
                cancel: Notify::new(),
                prompting: AtomicBool::new(false),
            }),
        }
    }
}
