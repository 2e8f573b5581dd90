//! Waiter port - injectable suspension for handlers.
//!
//! Handlers that need to pause (give a remediation time to settle, back off
//! a remote call) go through this instead of sleeping directly, so tests can
//! swap in `NoopWaiter`.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioWaiter;

#[async_trait]
impl Waiter for TokioWaiter {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWaiter;

#[async_trait]
impl Waiter for NoopWaiter {
    async fn wait(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokio_waiter_sleeps_for_duration() {
        let start = tokio::time::Instant::now();
        TokioWaiter.wait(Duration::from_millis(50)).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn noop_waiter_returns_immediately() {
        let start = std::time::Instant::now();
        NoopWaiter.wait(Duration::from_secs(60)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
