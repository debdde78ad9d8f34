//! Caller-supplied operation context
//!
//! Insert operations run for as long as the caller allows. An [`OpContext`]
//! carries an optional deadline and an optional cancellation signal; the
//! operation itself imposes no timeout.
//!
//! The cancellation signal is a `watch::Receiver<bool>`, the same shape the
//! binary uses for its Ctrl-C shutdown channel, so a running insert can be
//! abandoned when the process is asked to stop.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use svckit::domain::context::OpContext;
//! use svckit::domain::SvckitError;
//!
//! # async fn example() {
//! let ctx = OpContext::background().with_timeout(Duration::from_millis(10));
//! let result = ctx
//!     .run(async {
//!         tokio::time::sleep(Duration::from_secs(1)).await;
//!         Ok(())
//!     })
//!     .await;
//! assert!(matches!(result, Err(SvckitError::DeadlineExceeded)));
//! # }
//! ```

use crate::domain::errors::SvckitError;
use crate::domain::result::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Deadline and cancellation for a single operation
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl OpContext {
    /// A context that never expires and cannot be cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Expire at `deadline`; an earlier existing deadline is kept
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Cancel once `signal` becomes `true`
    pub fn with_cancel(mut self, signal: watch::Receiver<bool>) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True if the cancellation signal has already fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Runs `fut` until it completes, the deadline passes or the signal fires
    ///
    /// A dropped signal sender is treated as "never cancelled".
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            if let Some(rx) = cancel.as_mut() {
                let closed = rx.wait_for(|stop| *stop).await.is_err();
                if !closed {
                    return;
                }
            }
            std::future::pending::<()>().await
        };

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(SvckitError::Cancelled),
            _ = expired => Err(SvckitError::DeadlineExceeded),
            result = fut => result,
        }
    }
}
