//! Retry with exponential back-off and jitter for shop-service requests.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Everything else is returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - [`ClientError::RateLimited`]: HTTP 429.
/// - Any 5xx, whether it carried a JSON error body or not.
///
/// **Not retriable:**
/// - [`ClientError::NotFound`] and other 4xx statuses.
/// - [`ClientError::Deserialize`]: malformed response; retrying won't fix it.
/// - [`ClientError::InvalidBaseUrl`]: configuration problem.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::RateLimited { .. } => true,
        ClientError::UnexpectedStatus { status, .. } | ClientError::Api { status, .. } => {
            *status >= 500
        }
        ClientError::NotFound { .. }
        | ClientError::Deserialize { .. }
        | ClientError::InvalidBaseUrl { .. } => false,
    }
}

/// Longest wait between two attempts, `Retry-After` included.
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before retry number `retry` (1-based).
///
/// Exponential from `backoff_base_ms`, scaled by `jitter` (expected in
/// `0.75..=1.25`). A rate-limit reply's `Retry-After` is a floor under the
/// result. Everything is capped at [`MAX_DELAY_MS`].
fn backoff_delay_ms(retry: u32, backoff_base_ms: u64, err: &ClientError, jitter: f64) -> u64 {
    let exponential = backoff_base_ms
        .saturating_mul(1u64 << retry.saturating_sub(1).min(10))
        .min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (exponential as f64 * jitter) as u64;
    let floor = match err {
        ClientError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    jittered.max(floor).min(MAX_DELAY_MS)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// With `backoff_base_ms = 500` the waits are roughly 0.5 s, 1 s, 2 s, ...
/// (±25 %), or at least the service's `Retry-After` after a 429.
/// Non-retriable errors and the last failure are returned as they are.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries < max_retries && is_retriable(&err) => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay_ms = backoff_delay_ms(
            retries,
            backoff_base_ms,
            &err,
            rand::random_range(0.75..=1.25),
        );
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms,
            error = %err,
            "shop service request failed, backing off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn unavailable() -> ClientError {
        ClientError::UnexpectedStatus {
            status: 503,
            url: "http://localhost/api/shops".to_owned(),
        }
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&ClientError::NotFound {
            url: "x".to_owned()
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&ClientError::UnexpectedStatus {
            status: 403,
            url: "x".to_owned()
        }));
        assert!(!is_retriable(&ClientError::Api {
            status: 400,
            message: "bad".to_owned()
        }));
    }

    #[test]
    fn server_errors_and_rate_limits_are_retriable() {
        assert!(is_retriable(&unavailable()));
        assert!(is_retriable(&ClientError::Api {
            status: 500,
            message: "boom".to_owned()
        }));
        assert!(is_retriable(&ClientError::RateLimited {
            retry_after_secs: 1
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!is_retriable(&ClientError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }));
    }

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let err = unavailable();
        assert_eq!(backoff_delay_ms(1, 500, &err, 1.0), 500);
        assert_eq!(backoff_delay_ms(2, 500, &err, 1.0), 1000);
        assert_eq!(backoff_delay_ms(3, 500, &err, 1.0), 2000);
        assert_eq!(backoff_delay_ms(1, 500, &err, 0.75), 375);
    }

    #[test]
    fn delay_is_capped() {
        let err = unavailable();
        assert_eq!(backoff_delay_ms(20, 500, &err, 1.25), MAX_DELAY_MS);
        let limited = ClientError::RateLimited {
            retry_after_secs: 3600,
        };
        assert_eq!(backoff_delay_ms(1, 500, &limited, 1.0), MAX_DELAY_MS);
    }

    #[test]
    fn retry_after_is_a_floor_for_rate_limits() {
        let limited = ClientError::RateLimited {
            retry_after_secs: 5,
        };
        assert_eq!(backoff_delay_ms(1, 0, &limited, 0.75), 5000);
        assert_eq!(backoff_delay_ms(1, 500, &limited, 1.25), 5000);
        // A longer exponential delay wins over a short Retry-After.
        let short = ClientError::RateLimited {
            retry_after_secs: 1,
        };
        assert_eq!(backoff_delay_ms(4, 500, &short, 1.0), 4000);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ClientError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(unavailable())
                } else {
                    Ok::<u32, ClientError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(unavailable())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "max_retries=2 means 3 attempts");
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ClientError::NotFound {
                    url: "http://localhost/api/shops/9/rates".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "NotFound must not be retried");
        assert!(matches!(result, Err(ClientError::NotFound { .. })));
    }
}
