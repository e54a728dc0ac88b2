//! Bounded retry with exponential backoff
//!
//! Only idempotent steps go through here. Asset copies qualify; service
//! calls are attempted once and never wrapped.
//! - Max attempts: 3 by default
//! - Strategy: binary exponential with ±25% jitter, capped

use crate::errors::{AnalysisError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Default number of attempts, including the first one
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff
const BASE_DELAY_MS: u64 = 50;

/// Maximum delay cap
const MAX_DELAY_MS: u64 = 1000;

/// Retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    pub fn with_config(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The last error is returned unchanged when attempts are exhausted.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) {
                        return Err(e);
                    }

                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Transient failures only; a missing bundled file will still be missing.
fn is_retryable(error: &AnalysisError) -> bool {
    match error {
        AnalysisError::Io(e) => !matches!(
            e.kind(),
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
        ),
        AnalysisError::Timeout { .. } => true,
        _ => false,
    }
}
