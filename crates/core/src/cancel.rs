//! Run-wide cancellation signal.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Cancellation shared by the feeder, the pool and every worker.
///
/// Bundles the signal and its trigger in one explicit handle. Clones observe
/// and trigger the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    token: CancellationToken,
}

impl CancelContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once [`CancelContext::cancel`] has been called on any clone.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
