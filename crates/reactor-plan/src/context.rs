//! Execution context threaded through a plan run.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Cancellation, deadline and identity of one plan execution.
///
/// Clones share the same cancellation token, so cancelling any clone stops
/// in-flight dispatches everywhere in the tree. Nodes never cancel their
/// siblings themselves.
#[derive(Debug, Clone)]
pub struct ExecContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    execution_id: Uuid,
}

impl ExecContext {
    /// Create a context with no deadline and a fresh execution id.
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            deadline: None,
            execution_id: Uuid::new_v4(),
        }
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancel this execution.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns true once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled() || self.remaining() == Some(Duration::ZERO)
    }

    /// Resolves when the context is cancelled or the deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancellation.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancellation.cancelled().await,
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = ExecContext::new();
        let child = ctx.clone();
        assert!(!child.is_cancelled());

        ctx.cancel();
        assert!(child.is_cancelled());
        assert_eq!(ctx.execution_id(), child.execution_id());
    }

    #[test]
    fn test_fresh_execution_ids() {
        assert_ne!(ExecContext::new().execution_id(), ExecContext::new().execution_id());
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let ctx = ExecContext::new().with_timeout(Duration::from_millis(10));
        assert!(ctx.remaining().is_some());

        ctx.done().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_external_token() {
        let token = CancellationToken::new();
        let ctx = ExecContext::new().with_cancellation(token.clone());

        token.cancel();
        ctx.done().await;
        assert!(ctx.is_cancelled());
    }
}
