//! Retry logic with exponential backoff
//!
//! Only the material upload step retries. The policy is a [`RetryConfig`] plus the
//! [`IsRetryable`] classification; [`backoff_delay`] is a pure function of the
//! policy so schedules can be checked without any I/O.
//!
//! # Example
//!
//! ```no_run
//! use md2wechat::retry::{IsRetryable, with_retry};
//! use md2wechat::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = with_retry(&config, || async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// WeChat errcodes worth another attempt
///
/// `-1` system busy, `45009`/`45011` rate limits, `40001`/`40014`/`42001` stale
/// access token (the client drops its cached token before reporting these).
pub const RETRYABLE_ERRCODES: &[i64] = &[-1, 45009, 45011, 40001, 40014, 42001];

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, 5xx, rate limits) return `true`. Validation-class
/// failures (unsupported format, oversized file, bad credentials) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Error::Http { status, .. } => *status >= 500 || *status == 429,
            Error::Platform { errcode, .. } => RETRYABLE_ERRCODES.contains(errcode),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            // A 2xx with an unusable body may still have created a media object
            Error::InvalidResponse(_) => false,
            Error::Config { .. }
            | Error::Validation(_)
            | Error::FileNotFound(_)
            | Error::Generation(_)
            | Error::UploadExhausted { .. }
            | Error::Image(_)
            | Error::Serialization(_)
            | Error::Other(_) => false,
        }
    }
}

/// Delay to wait before retry number `retry` (1-based), without jitter
///
/// `initial_delay * backoff_multiplier^(retry - 1)`, capped at `max_delay`.
pub fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
    let secs = config.initial_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    if !secs.is_finite() || secs >= config.max_delay.as_secs_f64() {
        return config.max_delay;
    }
    Duration::from_secs_f64(secs.max(0.0))
}

/// Execute an async operation, retrying transient failures
///
/// At most `config.max_attempts` calls are made (at least one). A non-retryable
/// error is returned immediately; when every attempt fails with a retryable error
/// the last one is returned, so callers can tell the two apart via
/// [`IsRetryable::is_retryable`].
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = backoff_delay(config, attempt);
                let delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, attempt, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
