//! Fixed-delay retry for read-after-write consistency checks

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gantry_core::config::RetryConfig;
use gantry_core::{HostError, HostResult};

/// How often and how patiently an operation is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.delay(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
///
/// Between attempts the task sleeps for `policy.delay`. Cancelling `cancel`
/// aborts both an in-flight attempt and the pause, returning
/// [`HostError::Cancelled`]. When attempts run out the last error is returned.
pub async fn with_retry<T, F, Fut, P>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
    is_retryable: P,
) -> HostResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HostResult<T>>,
    P: Fn(&HostError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(HostError::Cancelled);
        }
        attempts += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HostError::Cancelled),
            result = operation() => result,
        };

        let err = match outcome {
            Ok(value) => {
                if attempts > 1 {
                    debug!(
                        operation = operation_name,
                        attempts, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            debug!(
                operation = operation_name,
                error = %err,
                "Error is not retryable, failing immediately"
            );
            return Err(err);
        }

        if attempts >= max_attempts {
            debug!(
                operation = operation_name,
                attempts,
                error = %err,
                "Operation failed after maximum retries"
            );
            return Err(err);
        }

        warn!(
            operation = operation_name,
            attempts,
            error = %err,
            retry_in_ms = policy.delay.as_millis() as u64,
            "Operation failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HostError::Cancelled),
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}

/// [`with_retry`] with the consistency predicate: only 404 and 403 retry
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    operation: F,
) -> HostResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HostResult<T>>,
{
    with_retry(policy, cancel, operation_name, operation, HostError::is_transient).await
}
