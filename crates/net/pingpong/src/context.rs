//! Per-call deadline and cancellation.

use std::{future::Future, time::Duration};

use tokio::{sync::watch, time::Instant};

use crate::PingpongError;

/// Deadline and cancellation signal bounding a whole `ping` call.
///
/// The default context never expires and cannot be cancelled.
#[derive(Debug, Clone, Default)]
pub struct PingContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every [`PingContext`] derived from [`PingContext::cancellable`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl PingContext {
    /// A context without deadline or cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attach a cancellation signal, returning the handle that fires it.
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    /// Resolves once the call is cancelled or the deadline passes.
    ///
    /// Cancellation wins if both have already happened.
    pub(crate) async fn done(&self) -> PingpongError {
        let cancelled = async {
            match &self.cancel {
                Some(rx) => {
                    let mut rx = rx.clone();
                    // A dropped handle can no longer cancel.
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => PingpongError::Canceled,
            _ = expired => PingpongError::Timeout,
        }
    }

    /// Drive `fut` unless the context finishes first.
    pub(crate) async fn run<F, T>(&self, fut: F) -> Result<T, PingpongError>
    where
        F: Future<Output = Result<T, PingpongError>>,
    {
        tokio::select! {
            biased;
            error = self.done() => Err(error),
            result = fut => result,
        }
    }
}

/// Bound a single read or write by `timeout`.
pub(crate) async fn with_timeout<F, T, E>(timeout: Duration, fut: F) -> Result<T, PingpongError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<PingpongError>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(PingpongError::Timeout),
    }
}
