//! Retry policy for upstream calls.
//!
//! Only rate-limit errors are retried, with exponential backoff and jitter.
//! The concrete clients apply this internally so callers see either a final
//! payload or a terminal error.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

/// Initial backoff delay.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;
/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF_MS: u64 = 60_000;
/// Maximum retry attempts after the first call.
pub const MAX_RETRIES: usize = 5;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: usize,
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// The default backoff: 1s initial, 60s cap, 5 retries, jitter.
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Run `operation`, retrying with the default backoff while `is_retryable` holds.
///
/// `context` names the call in log lines (e.g. a route).
pub async fn with_retry<T, E, F, Fut, IsRetryable>(
    operation: F,
    is_retryable: IsRetryable,
    context: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error,
    IsRetryable: FnMut(&E) -> bool,
{
    with_retry_config(RetryConfig::default(), operation, is_retryable, context).await
}

/// [`with_retry`] with an explicit configuration.
pub async fn with_retry_config<T, E, F, Fut, IsRetryable>(
    config: RetryConfig,
    mut operation: F,
    is_retryable: IsRetryable,
    context: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error,
    IsRetryable: FnMut(&E) -> bool,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(config.into_backoff())
        .notify(|err, dur| {
            tracing::debug!(
                context,
                attempt = attempt.load(Ordering::SeqCst),
                retry_in = ?dur,
                error = %super::platform::short_error_message(err),
                "Rate limited, backing off"
            );
        })
        .when(is_retryable)
        .await
}
