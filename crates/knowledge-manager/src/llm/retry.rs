// Retry with exponential backoff, and pacing between rate-limited calls

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::Result;

const BASE_DELAY_MS: u64 = 1000;

/// How often and how patiently to retry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every further one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` and the default base delay.
    #[must_use]
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Execute `f`, retrying retryable failures with exponential backoff.
///
/// Errors for which [`crate::Error::is_retryable`] is false are returned
/// immediately.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    ?delay,
                    error = %e,
                    "Request failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fixed pause after each LLM call to stay under provider rate limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    /// Create a pacer sleeping `delay` per call.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// The configured pause.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured pause.
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        info!(seconds = self.delay.as_secs_f32(), "Waiting to avoid rate limits");
        sleep(self.delay).await;
    }
}
