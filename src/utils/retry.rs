//! Bounded retry with a fixed backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryConfig {
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Gave up; `attempts` counts every call made, including the first.
    Failed { last_error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    /// Convert to a Result, discarding the attempt count.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed { last_error, .. } => Err(last_error),
        }
    }
}

/// Classifies errors as transient.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation`, retrying errors the error type marks as retryable.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> RetryResult<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_when(config, operation, Retryable::is_retryable).await
}

/// Run `operation`, retrying every error for which `should_retry` holds.
///
/// Each retry is logged at `warn` level; the caller's span identifies the operation.
pub async fn with_retry_when<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> RetryResult<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(error) => {
                if attempts >= max_attempts || !should_retry(&error) {
                    return RetryResult::Failed {
                        last_error: error,
                        attempts,
                    };
                }

                tracing::warn!(
                    attempt = attempts,
                    max_attempts,
                    delay_ms = config.delay.as_millis() as u64,
                    "{error}; retrying"
                );
                sleep(config.delay).await;
            }
        }
    }
}
