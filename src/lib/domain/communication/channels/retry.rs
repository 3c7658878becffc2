//! Bounded retry with exponential backoff

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::warn;

use crate::domain::communication::errors::EmailError;

/// How a channel retries a failed provider call
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any delay, `Retry-After` hints included
    pub max_delay: Duration,

    /// Growth factor per retry
    pub multiplier: f64,

    /// Add up to 25% random delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Exponential policy with default growth and cap
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero based) following `err`
    pub fn delay_for(&self, retry: u32, err: &EmailError) -> Duration {
        if let Some(retry_after) = err.retry_after() {
            return retry_after.min(self.max_delay);
        }

        #[allow(clippy::cast_possible_wrap)]
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(retry as i32);

        let adjusted = if self.jitter && raw > 0.0 {
            raw * (1.0 + rand::thread_rng().gen_range(0.0..=0.25))
        } else {
            raw
        };

        Duration::from_secs_f64(adjusted.min(self.max_delay.as_secs_f64()))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or `1 + max_retries` attempts are spent.
    ///
    /// `operation` receives the one-based attempt number. Returns the last
    /// outcome together with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> (Result<T, EmailError>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, EmailError>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return (Ok(value), attempt),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt - 1, &err);

                    warn!(attempt, ?delay, error = %err, "provider call failed, retrying");

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    attempt += 1;
                }
                Err(err) => return (Err(err), attempt),
            }
        }
    }
}
