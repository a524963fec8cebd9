use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::forecast::ForecastApiError;

/// Backoff schedule for retrying failed calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt; `max_retries + 1` calls total.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry `attempt` (0-indexed): `base_delay * 2^attempt`.
    ///
    /// Growth is unbounded; the saturating arithmetic only keeps the factor
    /// from overflowing, it is not a delay cap.
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Decides whether a failed call is worth another attempt.
pub trait RetryPolicy<E> {
    fn is_retryable(&self, error: &E) -> bool;
}

/// Default policy for forecast API calls: transient failures (network, 5xx,
/// timeout) retry; validation, 4xx, and malformed-success failures raise
/// immediately.
pub struct TransientPolicy;

impl RetryPolicy<ForecastApiError> for TransientPolicy {
    fn is_retryable(&self, error: &ForecastApiError) -> bool {
        error.is_transient()
    }
}

/// Execute an async operation with exponential backoff between failed
/// attempts. Each backoff sleep is awaited to completion before the next
/// attempt starts.
pub async fn with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    policy: impl RetryPolicy<E>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempts = attempt + 1, "call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => {
                if !policy.is_retryable(&error) {
                    return Err(error);
                }

                if attempt == config.max_retries {
                    warn!(
                        attempts = attempt + 1,
                        error = %error,
                        "retry budget exhausted"
                    );
                    return Err(error);
                }

                let delay = config.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, backing off before retry"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
