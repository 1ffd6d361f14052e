//! Retry Executor
//!
//! Re-runs a fallible async operation until it succeeds, runs out of
//! attempts, or fails with an error the policy refuses to retry.

use std::future::Future;

use tracing::{debug, warn};

use crate::retry::{RetryOptions, RetryableError};

/// Runs `operation` under `options`.
///
/// Attempts are numbered from 1 and at most `options.max_attempts` calls are
/// made (a value of 0 still allows the first call). Between attempts the
/// executor sleeps according to the backoff strategy, never after the last
/// one. When it gives up, the error of the last attempt is returned as is.
pub async fn retry<T, E, F, Fut>(mut operation: F, mut options: RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if attempt >= max_attempts {
            warn!(attempts = attempt, error = %err, "Retry budget exhausted");
            return Err(err);
        }
        if !options.allows_retry(&err) {
            debug!(attempt, error = %err, "Error is not retryable");
            return Err(err);
        }

        if let Some(on_retry) = options.on_retry.as_mut() {
            on_retry(attempt, &err);
        }

        let wait = options.backoff.delay_for(options.delay, attempt);
        warn!(
            attempt,
            max_attempts,
            wait = ?wait,
            error = %err,
            "Operation failed, retrying"
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    use crate::error::ClientError;
    use crate::retry::Backoff;

    fn network_error() -> ClientError {
        ClientError::Network("connection reset".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));

        let op_calls = calls.clone();
        let retry_count = retries.clone();
        let result = retry(
            || {
                let n = op_calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(network_error())
                    } else {
                        Ok("success")
                    }
                }
            },
            RetryOptions::new()
                .max_attempts(3)
                .delay(Duration::from_millis(10))
                .on_retry(move |_, _| {
                    retry_count.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .await;

        assert_eq!(assert_ok!(result), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_makes_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let result: Result<u32, ClientError> = retry(
            || {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            },
            RetryOptions::new(),
        )
        .await;

        assert_eq!(assert_ok!(result), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_original() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let result: Result<(), ClientError> = retry(
            || {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async { Err(network_error()) }
            },
            RetryOptions::new().max_attempts(3).should_retry(|_| false),
        )
        .await;

        let err = assert_err!(result);
        assert!(matches!(&err, ClientError::Network(msg) if msg == "connection reset"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_not_retried_by_default() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let result: Result<(), ClientError> = retry(
            || {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::Http {
                        status: 400,
                        body: "bad request".to_string(),
                    })
                }
            },
            RetryOptions::new(),
        )
        .await;

        assert_eq!(assert_err!(result).status(), Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();
        let retry_count = retries.clone();

        let result: Result<(), ClientError> = retry(
            || {
                let n = op_calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Err(ClientError::Http {
                        status: 503,
                        body: format!("attempt {n}"),
                    })
                }
            },
            RetryOptions::new()
                .max_attempts(3)
                .delay(Duration::from_millis(5))
                .on_retry(move |_, _| {
                    retry_count.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .await;

        let err = assert_err!(result);
        assert!(matches!(&err, ClientError::Http { body, .. } if body == "attempt 3"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2, "No retry hook after the final attempt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_wait_between_attempts() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let op_starts = starts.clone();
        let origin = Instant::now();

        let result: Result<(), ClientError> = retry(
            || {
                op_starts.lock().unwrap().push(origin.elapsed());
                async { Err(network_error()) }
            },
            RetryOptions::new()
                .max_attempts(3)
                .delay(Duration::from_millis(100))
                .backoff(Backoff::Exponential),
        )
        .await;
        let finished = origin.elapsed();

        assert_err!(result);
        let starts = starts.lock().unwrap().clone();
        assert_eq!(
            starts,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(300),
            ]
        );
        assert_eq!(finished, Duration::from_millis(300), "No wait after the final attempt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_wait_between_attempts() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let op_starts = starts.clone();
        let origin = Instant::now();

        let _: Result<(), ClientError> = retry(
            || {
                op_starts.lock().unwrap().push(origin.elapsed());
                async { Err(network_error()) }
            },
            RetryOptions::new()
                .max_attempts(4)
                .delay(Duration::from_millis(100))
                .backoff(Backoff::Linear),
        )
        .await;

        let starts = starts.lock().unwrap().clone();
        assert_eq!(
            starts,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(300),
                Duration::from_millis(600),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_retry_receives_attempt_numbers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = seen.clone();

        let _: Result<(), ClientError> = retry(
            || async { Err(network_error()) },
            RetryOptions::new()
                .max_attempts(3)
                .delay(Duration::from_millis(1))
                .on_retry(move |attempt, err: &ClientError| {
                    hook_seen.lock().unwrap().push((attempt, err.to_string()));
                }),
        )
        .await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[1].0, 2);
        assert!(seen[0].1.contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let _: Result<(), ClientError> = retry(
            || {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async { Err(network_error()) }
            },
            RetryOptions::new().max_attempts(0),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_delay_waits_instead_of_failing() {
        let calls = Arc::new(AtomicU32::new(0));
        let op_calls = calls.clone();

        let handle = tokio::spawn(retry(
            move || {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(network_error()) }
            },
            RetryOptions::new()
                .max_attempts(5)
                .delay(Duration::MAX)
                .backoff(Backoff::Exponential),
        ));

        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!handle.is_finished(), "Still sleeping before the second attempt");
        handle.abort();
    }
}
