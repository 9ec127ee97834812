//! Retry handling for transient OCR service errors.
//!
//! Exponential backoff with Retry-After header support. Auth and
//! malformed-response errors are never retried.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::{OcrClient, OcrError};

/// Maximum backoff delay (seconds).
const MAX_BACKOFF_SECS: u64 = 60;

/// Parse a Retry-After header value given in seconds.
/// Returns the duration to wait, or None if the value is missing/invalid.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs.min(MAX_BACKOFF_SECS)));
    }

    // HTTP-date form is not worth supporting for this service
    None
}

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_SECS * 1000))
}

/// Retry budget and pacing for recognition calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds).
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_OCR_MAX_RETRIES,
            base_delay_ms: crate::config::DEFAULT_RETRY_BASE_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Run one recognition call under this policy.
    ///
    /// Transient failures (rate limit, unavailable, transport) are
    /// retried up to `max_retries` times, waiting the server-suggested
    /// Retry-After when present and exponential backoff otherwise.
    /// Non-transient failures return immediately.
    pub async fn recognize(
        &self,
        client: &dyn OcrClient,
        png: &[u8],
    ) -> Result<String, OcrError> {
        let mut attempt = 0u32;

        loop {
            match client.recognize(png).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let wait = match &err {
                        OcrError::RateLimited {
                            retry_after: Some(after),
                        } => *after,
                        _ => backoff_delay(attempt, self.base_delay_ms),
                    };
                    debug!(attempt, ?wait, "transient OCR error, backing off: {err}");
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!("OCR retry budget ({}) exhausted: {err}", self.max_retries);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Attempts made when the budget is exhausted (first try + retries).
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn parse_retry_after_seconds() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some("0")), Some(Duration::from_secs(0)));
        assert_eq!(parse_retry_after(Some("100")), Some(Duration::from_secs(60))); // capped
    }

    #[test]
    fn parse_retry_after_invalid() {
        assert_eq!(parse_retry_after(None), None);
        assert_eq!(parse_retry_after(Some("invalid")), None);
    }

    #[test]
    fn backoff_delay_doubles_and_caps() {
        assert_eq!(backoff_delay(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_delay(10, 1000), Duration::from_secs(60)); // capped
    }

    /// Stub client that fails a fixed number of times before succeeding.
    struct FlakyClient {
        calls: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl OcrClient for FlakyClient {
        async fn recognize(&self, _png: &[u8]) -> Result<String, OcrError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(OcrError::Unavailable("503".into()))
            } else {
                Ok("recovered".into())
            }
        }
    }

    struct AuthFailClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl OcrClient for AuthFailClient {
        async fn recognize(&self, _png: &[u8]) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OcrError::Auth("invalid key".into()))
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let client = FlakyClient {
            calls: AtomicU32::new(0),
            failures: 2,
        };
        let policy = RetryPolicy::new(3, 1);
        let text = policy.recognize(&client, b"png").await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_last_error() {
        let client = FlakyClient {
            calls: AtomicU32::new(0),
            failures: 10,
        };
        let policy = RetryPolicy::new(2, 1);
        let err = policy.recognize(&client, b"png").await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), policy.total_attempts());
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let client = AuthFailClient {
            calls: AtomicU32::new(0),
        };
        let policy = RetryPolicy::new(5, 1);
        let err = policy.recognize(&client, b"png").await.unwrap_err();
        assert!(matches!(err, OcrError::Auth(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
