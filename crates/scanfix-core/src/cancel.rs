//! Cooperative cancellation
//!
//! Long-running loops poll a [`CancelToken`] at a bounded interval and
//! return [`Error::Cancelled`] once the host has requested an abort.
//! Nothing is unwound; the error travels up through ordinary `?`
//! propagation and no partial result is handed back.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so the host keeps one clone and passes
/// another into the engine.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Poll the flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] once [`cancel`](Self::cancel) was called.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
