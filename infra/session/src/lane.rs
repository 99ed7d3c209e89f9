//! Single-concurrency operation lane.
//!
//! Every mutation of the session runs while holding the lane, and the lane admits one
//! holder at a time in FIFO order. Inside a holding, operations are scheduled with at most
//! one dependency (invalidation check, then authenticate or use) and a dependent refuses to
//! start before its dependency has finished.

use crate::error::SessionError;
use crate::state::SessionCore;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Invalidate { force: bool },
    Authenticate,
    UseContext,
    Configure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingOperation {
    pub(crate) id: u64,
    pub(crate) kind: OperationKind,
    pub(crate) depends_on: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct Lane {
    core: Mutex<SessionCore>,
    next_op: AtomicU64,
}

impl Lane {
    pub(crate) fn new(invalidate_after: Duration) -> Self {
        Self { core: Mutex::new(SessionCore::new(invalidate_after)), next_op: AtomicU64::new(1) }
    }

    /// Waits for the lane. Waiters are admitted in arrival order.
    pub(crate) async fn enter(&self) -> LaneGuard<'_> {
        LaneGuard { core: self.core.lock().await, next_op: &self.next_op, finished: Vec::new() }
    }
}

#[derive(Debug)]
pub(crate) struct LaneGuard<'a> {
    core: MutexGuard<'a, SessionCore>,
    next_op: &'a AtomicU64,
    finished: Vec<u64>,
}

impl LaneGuard<'_> {
    pub(crate) fn schedule(
        &self,
        kind: OperationKind,
        depends_on: Option<&PendingOperation>,
    ) -> PendingOperation {
        PendingOperation {
            id: self.next_op.fetch_add(1, Ordering::Relaxed),
            kind,
            depends_on: depends_on.map(|dep| dep.id),
        }
    }

    /// # Errors
    /// [`SessionError::Internal`] if the dependency of `op` has not finished in this holding.
    pub(crate) fn begin(&self, op: &PendingOperation) -> Result<(), SessionError> {
        if let Some(dep) = op.depends_on
            && !self.finished.contains(&dep)
        {
            return Err(format!("operation {} started before its dependency {dep}", op.id).into());
        }
        trace!(op = op.id, kind = ?op.kind, depends_on = ?op.depends_on, "Lane operation started");
        Ok(())
    }

    pub(crate) fn complete(&mut self, op: PendingOperation) {
        trace!(op = op.id, kind = ?op.kind, "Lane operation finished");
        self.finished.push(op.id);
    }
}

impl Deref for LaneGuard<'_> {
    type Target = SessionCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl DerefMut for LaneGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dependents_wait_for_their_dependency() {
        let lane = Lane::new(Duration::from_secs(10));
        let mut guard = lane.enter().await;

        let check = guard.schedule(OperationKind::Invalidate { force: false }, None);
        let use_op = guard.schedule(OperationKind::UseContext, Some(&check));
        assert_eq!(use_op.depends_on, Some(check.id));

        assert!(guard.begin(&use_op).is_err());
        guard.begin(&check).unwrap();
        guard.complete(check);
        guard.begin(&use_op).unwrap();
    }

    #[tokio::test]
    async fn one_holder_at_a_time() {
        let lane = std::sync::Arc::new(Lane::new(Duration::from_secs(10)));
        let guard = lane.enter().await;

        let waiter = {
            let lane = lane.clone();
            tokio::spawn(async move { lane.enter().await.invalidate_after })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(waiter.await.unwrap(), Duration::from_secs(10));
    }
}
