//! Cooperative cancellation for long walk-forward runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The run was stopped through its [`CancellationToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("walk-forward run cancelled")]
pub struct Cancelled;

/// Shared flag checked between optimizer batches and between windows.
///
/// Clones share the same flag, so a caller can keep one clone and hand the
/// other to the run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
