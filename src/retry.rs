//! Retry executor for remote calls.
//!
//! Wraps an arbitrary async operation in exponential backoff with jitter.
//! Only failures classified as transient by [`RemoteError::is_transient`]
//! are retried; anything else surfaces immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::{RemoteError, RetryError};

/// Upper bound (exclusive) for the random jitter added to each backoff delay.
const JITTER_MS: u64 = 200;

/// Configuration for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Multiplier applied per attempt.
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(400),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Preset for cheap read calls where waiting out five attempts is not worth it.
    pub fn lightweight() -> Self {
        Self {
            max_attempts: 3,
            ..Self::default()
        }
    }

    /// Backoff delay before the retry following the given zero-based attempt,
    /// without jitter. delay = base_delay * backoff_factor^attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * self.backoff_factor.saturating_pow(attempt)
    }
}

/// Run `op` under the given policy.
///
/// Suspends only the calling task during backoff sleeps. Exhaustion wraps
/// the last underlying failure in [`RetryError::Exhausted`].
pub async fn run<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(RetryError::Fatal(err)),
            Err(err) => {
                if attempt + 1 >= max {
                    return Err(RetryError::Exhausted {
                        attempts: max,
                        source: err,
                    });
                }
                let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
                sleep(policy.delay_for_attempt(attempt) + Duration::from_millis(jitter)).await;
                attempt += 1;
            }
        }
    }
}
