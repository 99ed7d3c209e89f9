use crate::builder::SessionBuilder;
use crate::error::{CredentialFailure, SessionError};
use crate::lane::{Lane, LaneGuard, OperationKind, PendingOperation};
use crate::prompt::{AuthenticationPrompt, PromptError};
use crate::state::SessionState;
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use svault_domain::{AuthContext, KeyPolicy};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct SessionInner {
    pub(crate) prompt: Arc<dyn AuthenticationPrompt>,
    pub(crate) lane: Lane,
    pub(crate) automatic: AtomicBool,
    pub(crate) reason: RwLock<Arc<str>>,
    pub(crate) cancel: Notify,
    pub(crate) prompting: AtomicBool,
}

/// Process-wide authentication session.
///
/// Tracks whether the user recently passed the platform challenge and hands out the
/// [`AuthContext`] that secure hardware demands. A cached authentication is reused until
/// `invalidate_after` has passed since the last use, or since the app went to the background.
/// Nothing is persisted: a new process starts `Unauthenticated`.
///
/// All state changes go through one lane, so two prompts never race and no use proceeds
/// on a context that a concurrent invalidation is discarding.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl Deref for AuthSession {
    type Target = SessionInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AuthSession {
    #[must_use = "The session is not created until you call .build()"]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Makes sure the user is authenticated, prompting only when the cache is stale.
    ///
    /// `reason` overrides the configured prompt text for this call.
    ///
    /// # Errors
    /// * [`SessionError::Cancelled`] when the prompt was dismissed or cancelled.
    /// * [`SessionError::Platform`] for any other prompt failure.
    pub async fn authenticate(&self, reason: Option<&str>) -> Result<(), SessionError> {
        let mut lane = self.lane.enter().await;
        let check = lane.schedule(OperationKind::Invalidate { force: false }, None);
        let auth = lane.schedule(OperationKind::Authenticate, Some(&check));

        self.run_invalidation(&mut lane, check)?;
        lane.begin(&auth)?;
        let outcome = self.ensure_authenticated(&mut lane, reason).await;
        lane.last_backgrounded = None;
        lane.complete(auth);
        outcome.map(|_| ())
    }

    /// Discards the authenticated context if `force` is set or the cache is stale.
    /// Returns whether an authenticated context was discarded.
    ///
    /// # Errors
    /// [`SessionError::Internal`] if the lane is misused.
    pub async fn invalidate(&self, force: bool) -> Result<bool, SessionError> {
        let mut lane = self.lane.enter().await;
        let op = lane.schedule(OperationKind::Invalidate { force }, None);
        self.run_invalidation(&mut lane, op)
    }

    /// Runs `op` with a live authenticated context, authenticating first when needed.
    ///
    /// For [`KeyPolicy::Paranoid`] the application password is requested once per context
    /// and bound to it. If `op` then fails because the hardware refused that password, the
    /// password is unbound again and the next paranoid use asks for it anew. A successful
    /// `op` slides the access window forward. `op` runs inside the lane: nothing else
    /// touches the session until it finishes.
    ///
    /// # Errors
    /// Session failures converted into `E`, or whatever `op` returns.
    pub async fn use_context<T, E, F, Fut>(&self, policy: KeyPolicy, op: F) -> Result<T, E>
    where
        F: FnOnce(AuthContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<SessionError> + CredentialFailure,
    {
        let mut lane = self.lane.enter().await;
        let check = lane.schedule(OperationKind::Invalidate { force: false }, None);
        let use_op = lane.schedule(OperationKind::UseContext, Some(&check));

        self.run_invalidation(&mut lane, check)?;
        lane.begin(&use_op)?;

        let mut ctx = self.ensure_authenticated(&mut lane, None).await?;
        if policy == KeyPolicy::Paranoid && ctx.credential().is_none() {
            ctx = self.bind_application_password(&mut lane, ctx).await?;
        }

        let result = op(ctx).await;
        match &result {
            Ok(_) => lane.refresh(Instant::now()),
            Err(err) if policy == KeyPolicy::Paranoid && err.rejects_credential() => {
                Self::unbind_application_password(&mut lane);
            },
            Err(_) => {},
        }
        lane.complete(use_op);
        result
    }

    /// Records that the host app went to the background. Backgrounding never discards the
    /// context by itself: the marker is judged by the next invalidation check. In automatic
    /// mode that check runs right away, which only discards a context under a zero window.
    ///
    /// # Errors
    /// [`SessionError::Internal`] if the lane is misused.
    pub async fn on_background(&self) -> Result<(), SessionError> {
        self.note_backgrounded().await;
        if self.automatic() {
            self.invalidate(false).await?;
        }
        Ok(())
    }

    /// Host app came back. In automatic mode this authenticates right away.
    ///
    /// # Errors
    /// As for [`authenticate`](Self::authenticate).
    pub async fn on_foreground(&self) -> Result<(), SessionError> {
        if self.automatic() { self.authenticate(None).await } else { Ok(()) }
    }

    /// Stores `lastBackgrounded = now`; invalidation is evaluated later.
    pub async fn note_backgrounded(&self) {
        let mut lane = self.lane.enter().await;
        lane.last_backgrounded = Some(Instant::now());
        debug!("Session backgrounded");
    }

    /// Changes the staleness window. Queued behind any in-flight evaluation.
    pub async fn set_invalidate_after(&self, window: Duration) {
        let mut lane = self.lane.enter().await;
        let op = lane.schedule(OperationKind::Configure, None);
        lane.invalidate_after = window;
        lane.complete(op);
        info!(secs = window.as_secs_f64(), "Invalidation timeout changed");
    }

    pub async fn invalidate_after(&self) -> Duration {
        self.lane.enter().await.invalidate_after
    }

    pub async fn state(&self) -> SessionState {
        self.lane.enter().await.state
    }

    pub fn set_automatic(&self, enabled: bool) {
        self.automatic.store(enabled, Ordering::Release);
        info!(enabled, "Automatic authentication toggled");
    }

    #[must_use]
    pub fn automatic(&self) -> bool {
        self.automatic.load(Ordering::Acquire)
    }

    pub fn set_reason(&self, reason: impl Into<Arc<str>>) {
        *self.reason.write() = reason.into();
    }

    #[must_use]
    pub fn reason(&self) -> Arc<str> {
        self.reason.read().clone()
    }

    /// Aborts the prompt currently on screen, if any. The waiting operation fails with
    /// [`SessionError::Cancelled`] and the session state is left as it was.
    pub fn cancel_prompt(&self) -> bool {
        if self.prompting.load(Ordering::Acquire) {
            self.cancel.notify_waiters();
            true
        } else {
            false
        }
    }

    fn run_invalidation(
        &self,
        lane: &mut LaneGuard<'_>,
        op: PendingOperation,
    ) -> Result<bool, SessionError> {
        lane.begin(&op)?;
        let OperationKind::Invalidate { force } = op.kind else {
            return Err("invalidation scheduled with the wrong kind".into());
        };

        let discarded = if lane.should_invalidate(force, Instant::now()) && lane.reset() {
            info!(force, "Authenticated context discarded");
            true
        } else {
            false
        };
        lane.complete(op);
        Ok(discarded)
    }

    /// Cache hit or prompt. A prompt clears the background marker whatever its outcome.
    async fn ensure_authenticated(
        &self,
        lane: &mut LaneGuard<'_>,
        reason: Option<&str>,
    ) -> Result<AuthContext, SessionError> {
        if let Some(ctx) = lane.current() {
            debug!(context = ctx.id(), "Authentication cache hit");
            return Ok(ctx.clone());
        }

        let reason = reason.map_or_else(|| self.reason(), Arc::from);
        let outcome = self.prompt_with(|| self.prompt.evaluate(&reason)).await;
        lane.last_backgrounded = None;

        match outcome {
            Ok(()) => {
                let ctx = lane.establish(Instant::now());
                info!(context = ctx.id(), "Authenticated");
                Ok(ctx)
            },
            Err(err) => {
                warn!(kind = err.kind(), "Authentication prompt failed");
                Err(err)
            },
        }
    }

    async fn bind_application_password(
        &self,
        lane: &mut LaneGuard<'_>,
        ctx: AuthContext,
    ) -> Result<AuthContext, SessionError> {
        let reason = self.reason();
        let password =
            self.prompt_with(|| self.prompt.request_application_password(&reason)).await?;
        let ctx = ctx.with_credential(password);
        lane.context = Some(ctx.clone());
        debug!(context = ctx.id(), "Application password bound");
        Ok(ctx)
    }

    fn unbind_application_password(lane: &mut LaneGuard<'_>) {
        if let Some(ctx) = lane.context.take() {
            warn!(context = ctx.id(), "Application password refused, unbinding it");
            lane.context = Some(ctx.without_credential());
        }
    }

    /// Runs a prompt that [`cancel_prompt`](Self::cancel_prompt) can interrupt.
    async fn prompt_with<T, F, Fut>(&self, start: F) -> Result<T, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PromptError>>,
    {
        let cancelled = self.cancel.notified();
        self.prompting.store(true, Ordering::Release);

        let outcome = tokio::select! {
            biased;
            () = cancelled => Err(SessionError::cancelled("prompt cancelled by caller")),
            result = start() => result.map_err(SessionError::from),
        };

        self.prompting.store(false, Ordering::Release);
        outcome
    }
}
