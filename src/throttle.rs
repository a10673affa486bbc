//! Request pacing and throttle-retry policy.
//!
//! All waiting goes through a [`Sleeper`] so tests can run the pipeline
//! without real delays.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Something that can suspend the pipeline for a while.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Policy applied before every listing-detail fetch.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pace(&self);
}

/// Waits a fixed delay, plus optional random jitter, before each request.
pub struct FixedDelay {
    delay_ms: u64,
    jitter_ms: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl FixedDelay {
    pub fn new(delay_ms: u64, jitter_ms: u64, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { delay_ms, jitter_ms, sleeper }
    }

    /// Total delay for the next request.
    fn next_delay(&self) -> Duration {
        let jitter =
            if self.jitter_ms > 0 { rand::random_range(0..=self.jitter_ms) } else { 0 };

        Duration::from_millis(self.delay_ms + jitter)
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pace(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }

        debug!("Delaying {}ms", delay.as_millis());
        self.sleeper.sleep(delay).await;
    }
}

/// Pacing disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn pace(&self) {}
}

/// How long to back off, and how many times to try, when a results page
/// comes back empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total fetch attempts per page; `None` retries forever
    pub max_attempts: Option<u32>,
    /// Sleep before the first retry
    pub backoff: Duration,
    /// Growth factor applied to the sleep on each further retry
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Retries forever with a constant backoff.
    pub fn unbounded(backoff: Duration) -> Self {
        Self { max_attempts: None, backoff, multiplier: 1.0 }
    }

    /// Retries at most `max_attempts` fetches in total.
    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts: Some(max_attempts), backoff, multiplier: 1.0 }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Returns true if fetch attempt number `attempt` (1-based) may run.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(self.backoff.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(120))
    }
}
