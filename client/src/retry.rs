//! Retry logic for network reads.
//!
//! Health polls and ledger lookups go over flaky public endpoints. Everything
//! here wraps an async operation in exponential backoff and gives up on
//! errors that another attempt cannot fix.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result, RetryContext};
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry strategy configuration
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of retries
    pub max_retries: usize,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl RetryStrategy {
    /// Create a new retry strategy from harness config
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            multiplier: config.retry_multiplier,
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Check if an error is retryable
    pub fn is_retryable(error: &HarnessError) -> bool {
        match error {
            HarnessError::NetworkError(_) => true,
            HarnessError::RateLimitExceeded(_) => true,
            // Only 5xx responses
            HarnessError::HorizonError(msg) | HarnessError::SorobanRpcError(msg) => {
                msg.contains("500") || msg.contains("502") || msg.contains("503")
            }
            HarnessError::InvalidResponse(_) => true,
            // A reverted simulation, a rejected observation or bad config
            // will fail the same way again.
            _ => false,
        }
    }

    /// Execute an operation with retry logic
    pub async fn retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retry_with_predicate(operation, Self::is_retryable)
            .await
    }

    /// Execute an operation with retry logic and a custom retry predicate
    pub async fn retry_with_predicate<F, Fut, T, P>(
        &self,
        operation: F,
        should_retry: P,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&HarnessError) -> bool,
    {
        let mut backoff = self.create_backoff();
        let mut retry_ctx = RetryContext::new();

        loop {
            debug!(
                "Attempt {} of {}",
                retry_ctx.attempts + 1,
                self.max_retries + 1
            );

            let error = match operation().await {
                Ok(result) => {
                    if retry_ctx.attempts > 0 {
                        debug!(
                            "Operation succeeded after {} retries ({} ms waiting)",
                            retry_ctx.attempts, retry_ctx.total_time_ms
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            if !should_retry(&error) {
                warn!("Non-retryable error: {}", error);
                return Err(error);
            }

            if retry_ctx.attempts >= self.max_retries {
                warn!(
                    "Max retries ({}) exceeded. Last error: {}",
                    self.max_retries, error
                );
                return Err(HarnessError::MaxRetriesExceeded(self.max_retries));
            }

            let Some(delay) = backoff.next_backoff() else {
                warn!("Backoff exhausted");
                return Err(HarnessError::MaxRetriesExceeded(self.max_retries));
            };

            retry_ctx.record_attempt(&error.to_string(), delay.as_millis() as u64);
            warn!(
                "Attempt {} failed: {}. Retrying in {:?}",
                retry_ctx.attempts, error, delay
            );

            tokio::time::sleep(delay).await;
        }
    }
}
