use std::time::Duration;
use svault_domain::AuthContext;
use tokio::time::Instant;

/// Observable state of an [`AuthSession`](crate::AuthSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { since: Instant },
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Mutable session data. Only reachable through the lane.
#[derive(Debug)]
pub(crate) struct SessionCore {
    pub(crate) state: SessionState,
    pub(crate) context: Option<AuthContext>,
    pub(crate) invalidate_after: Duration,
    pub(crate) last_backgrounded: Option<Instant>,
    next_context: u64,
}

impl SessionCore {
    pub(crate) const fn new(invalidate_after: Duration) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            context: None,
            invalidate_after,
            last_backgrounded: None,
            next_context: 1,
        }
    }

    /// A zero window never keeps anything; otherwise staleness is strictly past the window.
    fn expired(&self, reference: Instant, now: Instant) -> bool {
        self.invalidate_after.is_zero() || now > reference + self.invalidate_after
    }

    pub(crate) fn access_stale(&self, now: Instant) -> bool {
        match self.state {
            SessionState::Authenticated { since } => self.expired(since, now),
            SessionState::Unauthenticated => false,
        }
    }

    pub(crate) fn background_stale(&self, now: Instant) -> bool {
        self.last_backgrounded.is_some_and(|at| self.expired(at, now))
    }

    pub(crate) fn should_invalidate(&self, force: bool, now: Instant) -> bool {
        force || self.access_stale(now) || self.background_stale(now)
    }

    /// Drops to `Unauthenticated`, revoking the context so in-flight holders see it too.
    /// Returns whether an authenticated context was discarded.
    pub(crate) fn reset(&mut self) -> bool {
        let discarded = self.state.is_authenticated();
        if let Some(ctx) = self.context.take() {
            ctx.revoke();
        }
        self.state = SessionState::Unauthenticated;
        discarded
    }

    pub(crate) fn establish(&mut self, now: Instant) -> AuthContext {
        let ctx = AuthContext::new(self.next_context, now);
        self.next_context += 1;
        if let Some(previous) = self.context.replace(ctx.clone()) {
            previous.revoke();
        }
        self.state = SessionState::Authenticated { since: now };
        ctx
    }

    pub(crate) fn current(&self) -> Option<&AuthContext> {
        match self.state {
            SessionState::Authenticated { .. } => self.context.as_ref(),
            SessionState::Unauthenticated => None,
        }
    }

    /// Slides the access window after a successful use.
    pub(crate) fn refresh(&mut self, now: Instant) {
        if let SessionState::Authenticated { since } = &mut self.state {
            *since = now;
        }
    }
}
