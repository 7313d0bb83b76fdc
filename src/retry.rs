/// Retry policy for RPC calls prone to rate limiting.
///
/// Two-phase strategy: fast exponential backoff for `max_retries` attempts,
/// then an extended wait that resets the counter and tries again
/// indefinitely. Only errors that look like a 429 are retried; anything
/// else fails immediately.
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries in the fast exponential backoff phase.
    pub max_retries: u32,

    /// Initial delay in milliseconds before the first retry.
    pub initial_delay_ms: u64,

    /// Multiplier for exponential backoff.
    /// Each retry delay = initial_delay_ms * backoff_multiplier^retry_count
    pub backoff_multiplier: u64,

    /// Wait time in seconds before entering extended retry mode.
    pub extended_retry_wait_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 200,
            backoff_multiplier: 4,
            extended_retry_wait_seconds: 300,
        }
    }
}

impl RetryConfig {
    pub fn new(
        max_retries: u32,
        initial_delay_ms: u64,
        backoff_multiplier: u64,
        extended_retry_wait_seconds: u64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            backoff_multiplier,
            extended_retry_wait_seconds,
        }
    }

    /// Execute an operation with retry logic.
    ///
    /// Only errors whose `Display` mentions "429" or "Too Many Requests"
    /// are retried; any other error is returned immediately.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::error::Error,
    {
        let mut extended_retry_count = 0;

        loop {
            let mut retries = 0;

            loop {
                match operation().await {
                    Ok(result) => return Ok(result),
                    Err(e) => {
                        let error_msg = e.to_string();

                        if error_msg.contains("429") || error_msg.contains("Too Many Requests") {
                            if retries < self.max_retries {
                                let delay_ms = self
                                    .initial_delay_ms
                                    .saturating_mul(self.backoff_multiplier.pow(retries));

                                tracing::debug!(
                                    "rate limited (429), retrying after {}ms (attempt {}/{})",
                                    delay_ms,
                                    retries + 1,
                                    self.max_retries
                                );

                                sleep(Duration::from_millis(delay_ms)).await;
                                retries += 1;
                                continue;
                            } else {
                                extended_retry_count += 1;
                                tracing::warn!(
                                    "max retries ({}) exhausted, waiting {}s before retry #{} (extended mode)",
                                    self.max_retries,
                                    self.extended_retry_wait_seconds,
                                    extended_retry_count
                                );

                                sleep(Duration::from_secs(self.extended_retry_wait_seconds)).await;
                                break;
                            }
                        } else {
                            return Err(format!("operation failed: {e}"));
                        }
                    }
                }
            }
        }
    }
}
