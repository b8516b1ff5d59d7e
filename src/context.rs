//! Cooperative cancellation for evaluation runs.
//!
//! An [`EvalContext`] pairs a cancellation token with an optional deadline.
//! Nothing is interrupted forcibly: the runner checks the context between
//! units of work and metrics that block are expected to race their work
//! against [`EvalContext::done`].

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::EvalError;

/// Cancellation signal and optional deadline shared by a run.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl EvalContext {
    /// Creates a context that only ends when cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Creates a context that ends after `timeout`.
    ///
    /// The returned guard cancels the context when dropped.
    pub fn timeout(timeout: Duration) -> (Self, DropGuard) {
        Self::new().with_timeout(timeout)
    }

    /// Derives a child context bounded by `timeout`.
    ///
    /// The child keeps the earlier of the parent's deadline and
    /// `now + timeout`, and observes cancellation of the parent. Dropping
    /// the guard cancels the child only.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, DropGuard) {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) => parent.min(candidate),
            None => candidate,
        };
        let token = self.token.child_token();
        let guard = token.clone().drop_guard();
        (
            Self {
                token,
                deadline: Some(deadline),
            },
            guard,
        )
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context ended, or `None` while it is still live.
    pub fn err(&self) -> Option<EvalError> {
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Some(EvalError::DeadlineExceeded);
        }
        if self.token.is_cancelled() {
            return Some(EvalError::Cancelled);
        }
        None
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}
