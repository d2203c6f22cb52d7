//! Generic retry engine with exponential backoff and jitter.
//!
//! Implemented as an explicit loop with an attempt counter rather than
//! recursive self-calls, so stack depth stays bounded and the wait between
//! attempts is a single suspension point other tasks can interleave with.

use crate::config::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_DELAY_MS, DEFAULT_JITTER_RATIO, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RETRIES,
};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Backoff configuration for retried operations.
///
/// The effective delay before retrying attempt `n` (1-indexed) is
/// `min(max_delay, base_delay * backoff_factor^(n-1) * jitter)` with
/// `jitter` sampled uniformly from `[1 - jitter_ratio/2, 1 + jitter_ratio/2]`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt (total attempts = max_attempts + 1).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any computed delay.
    pub max_delay: Duration,
    /// Exponential growth factor, must be > 1 for growing delays.
    pub backoff_factor: f64,
    /// Randomization ratio in `[0, 1]`; 0 disables jitter.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries. Useful when an inner layer already owns the
    /// retry budget and the outer layer must not multiply it.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Override the number of retries, keeping the remaining defaults.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Compute the backoff delay before retrying the given 1-indexed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let raw = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent as i32);
        let jitter = if self.jitter_ratio > 0.0 {
            let half = self.jitter_ratio / 2.0;
            rand::thread_rng().gen_range(1.0 - half..=1.0 + half)
        } else {
            1.0
        };
        let capped = (raw * jitter).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Errors that know whether another attempt could plausibly succeed.
///
/// Timeouts, connection failures, 5xx, 429 and 408 responses are transient;
/// other 4xx responses and structural failures (an ID that is simply not
/// there) are permanent. Unclassified errors default to retryable.
pub trait Retryable {
    /// Whether a retry could change the outcome.
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Run `op` up to `policy.max_attempts + 1` times, sleeping per the policy
/// between attempts.
///
/// `should_retry` short-circuits the loop for permanent errors. `on_retry`
/// fires with the error and the 1-indexed attempt number before every backoff
/// sleep; it is an observer for logging and telemetry, not control flow.
/// Fails with the last encountered error once attempts are exhausted.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(&E, u32),
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total_attempts = policy.max_attempts.saturating_add(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= total_attempts || !should_retry(&error) {
                    return Err(error);
                }
                on_retry(&error, attempt);
                let delay = policy.delay_for_attempt(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
