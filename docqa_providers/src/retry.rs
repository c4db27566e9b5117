use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts. An operation is tried once more than there are
/// delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Try once, never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ])
    }
}

/// Retry an async operation, sleeping for each of the policy's delays in
/// turn. Errors for which `is_retryable` is false are returned at once.
/// Otherwise returns the first success or the error of the final attempt.
pub async fn retry_with_backoff<F, Fut, T, E, R>(
    mut operation: F,
    policy: &RetryPolicy,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let attempts = policy.attempts();

    for (i, delay) in policy.delays.iter().enumerate() {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_retryable(&e) => {
                warn!("Request failed with a permanent error, not retrying: {e}");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Request failed (attempt {}/{attempts}): {e}. Retrying after {delay:?}...",
                    i + 1
                );
                sleep(*delay).await;
            }
        }
    }

    operation().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instant_policy(retries: usize) -> RetryPolicy {
        RetryPolicy::new(vec![Duration::ZERO; retries])
    }

    #[tokio::test]
    async fn retry_succeeds_on_first_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            &instant_policy(3),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err(String::from("fail"))
                    } else {
                        Ok(())
                    }
                }
            },
            &instant_policy(3),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_fails_after_all_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("fail {count}"))
                }
            },
            &instant_policy(2),
            |_| true,
        )
        .await;
        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_retry_policy_tries_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &RetryPolicy::none(),
            |_| true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count == 1 {
                        Err(String::from("transient"))
                    } else {
                        Err(String::from("permanent"))
                    }
                }
            },
            &instant_policy(5),
            |e| e != "permanent",
        )
        .await;
        assert_eq!(result, Err("permanent".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
