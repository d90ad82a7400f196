//! Bounded exponential-backoff retry for remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ApiResult, ErrorKind, TransportError};

/// Retry configuration applied uniformly to remote calls.
///
/// Merged from [`RetryPolicy::default`] and caller overrides at construction;
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the computed backoff delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// Failure kinds worth retrying; everything else propagates immediately.
    pub retryable: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            retryable: vec![
                ErrorKind::Connection,
                ErrorKind::Timeout,
                ErrorKind::Server,
                ErrorKind::RateLimit,
            ],
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the delay before the second attempt.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the upper bound on the computed backoff delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Replace the set of retryable failure kinds.
    pub fn with_retryable(mut self, kinds: Vec<ErrorKind>) -> Self {
        self.retryable = kinds;
        self
    }

    /// Whether a failure of `kind` is worth another attempt.
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Delay to wait after the failure of attempt `attempt` (1-based).
    ///
    /// A rate-limit failure carrying a `retry-after` hint overrides the
    /// computed backoff; the service's hint is authoritative and is not
    /// capped by `max_delay`.
    pub fn delay_for(&self, attempt: u32, error: &TransportError) -> Duration {
        if error.kind() == ErrorKind::RateLimit {
            if let Some(secs) = error.retry_after() {
                return Duration::from_secs(secs);
            }
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let backoff = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = backoff.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Run `operation` up to `policy.max_attempts` times.
///
/// Success returns immediately. A failure on the final attempt, or a failure
/// whose kind is not in `policy.retryable`, is returned as-is. Otherwise the
/// task sleeps for the computed backoff and tries again. Each retry emits a
/// warning naming the attempt and delay; the warning never affects control
/// flow.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= attempts || !policy.is_retryable(err.kind()) {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt, &err);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "remote call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
