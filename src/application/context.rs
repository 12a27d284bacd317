//! Request-scoped deadline and cancellation.
//!
//! A [`Context`] travels with every request through the services. Ledger
//! calls made under it are bounded by the remaining request deadline and by a
//! fixed per-call ceiling, whichever is shorter. Long-running tasks (streams,
//! the rate sampler) watch the same cancellation signal.

use crate::error::{LedgerError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const DEFAULT_CALL_CEILING: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: watch::Receiver<bool>,
    call_ceiling: Duration,
}

/// Cancels every context derived from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels the context tree.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background(DEFAULT_CALL_CEILING)
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline of its own.
    pub fn background(call_ceiling: Duration) -> Self {
        let (_, cancel) = watch::channel(false);
        Self {
            deadline: None,
            cancel,
            call_ceiling,
        }
    }

    pub fn with_cancel(call_ceiling: Duration) -> (Self, CancelHandle) {
        let (sender, cancel) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel,
            call_ceiling,
        };
        (ctx, CancelHandle { sender })
    }

    /// Child context whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(current) if current < candidate => current,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Same ceiling, no deadline, no cancellation. Used for work that must
    /// finish even after the caller went away.
    pub fn detached(&self) -> Self {
        Self::background(self.call_ceiling)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once the context is cancelled. Never resolves for a context
    /// whose cancel handle is gone without having fired.
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        loop {
            if *cancel.borrow_and_update() {
                return;
            }
            if cancel.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn budget(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.call_ceiling),
            None => self.call_ceiling,
        }
    }

    /// Runs one ledger call under the derived deadline.
    pub async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(LedgerError::Cancelled(operation.to_string()));
        }
        let budget = self.budget();
        if budget.is_zero() {
            return Err(LedgerError::Timeout(operation.to_string()));
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(LedgerError::Cancelled(operation.to_string())),
            result = tokio::time::timeout(budget, call) => {
                result.unwrap_or_else(|_| Err(LedgerError::Timeout(operation.to_string())))
            }
        }
    }
}
