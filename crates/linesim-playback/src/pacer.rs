//! The suspension step between messages.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// How a pause ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    /// The full delay elapsed.
    Elapsed,
    /// The token was cancelled before the delay elapsed.
    Cancelled,
}

/// Waits out a message delay, giving up early if `cancel` fires.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspend for `delay` or until `cancel` is cancelled.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> PaceOutcome;
}

/// [`Pacer`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> PaceOutcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => PaceOutcome::Cancelled,
            () = tokio::time::sleep(delay) => PaceOutcome::Elapsed,
        }
    }
}
