//! Per-call cancellation and deadline

use std::future::Future;
use std::time::{Duration, Instant};

use aura_domain::{AuraError, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Caller-supplied limits for a single operation.
///
/// The default context never cancels and has no deadline.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the call when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Abort the call at `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort the call once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Drive `operation` to completion unless the context is cancelled or its
    /// deadline passes first. The losing future is dropped, which aborts any
    /// in-flight request it owns.
    ///
    /// # Errors
    /// Returns [`AuraError::Cancelled`] or [`AuraError::Timeout`], or the
    /// operation's own error.
    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(AuraError::Cancelled);
        }

        let started = Instant::now();
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = operation => result,
            () = cancelled => {
                debug!("call cancelled by caller");
                Err(AuraError::Cancelled)
            }
            () = expired => {
                debug!("call deadline exceeded");
                Err(AuraError::Timeout(started.elapsed()))
            }
        }
    }
}
