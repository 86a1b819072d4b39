use std::future::Future;
use std::time::Duration;

use crate::error::{ApiError, SessionError};

/// Errors that can say whether repeating the same request might succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for ApiError {
    fn is_transient(&self) -> bool {
        ApiError::is_transient(self)
    }
}

impl Transient for SessionError {
    fn is_transient(&self) -> bool {
        SessionError::is_transient(self)
    }
}

/// Fixed-delay retry for idempotent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `2` means at most three requests.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Runs `op`, repeating it after `policy.delay` while it fails with a transient
/// error and retries remain. Non-transient errors return immediately.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn retry_transient<F, Fut, T, E>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let mut retries_left = policy.max_retries;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && retries_left > 0 => {
                retries_left -= 1;
                let delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(
                    error = %err,
                    retries_left,
                    delay_ms,
                    "transient failure, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_retries, Duration::from_millis(1))
    }

    fn unavailable() -> ApiError {
        ApiError::Unavailable {
            message: "down".into(),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicUsize::new(0);
        let res: Result<usize, ApiError> = retry_transient(quick(2), || async {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(unavailable()) } else { Ok(n) }
        })
        .await;

        assert_eq!(res, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let counter = AtomicUsize::new(0);
        let res: Result<(), ApiError> = retry_transient(quick(2), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert_eq!(res, Err(unavailable()));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let counter = AtomicUsize::new(0);
        let res: Result<(), ApiError> = retry_transient(quick(5), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::NotFound {
                message: "unknown attempt".into(),
            })
        })
        .await;

        assert!(matches!(res, Err(ApiError::NotFound { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_is_two_retries_five_seconds_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
