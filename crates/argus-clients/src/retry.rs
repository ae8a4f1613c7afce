//! Retry with exponential back-off and jitter for the external adapters.
//!
//! Only transient failures are retried: network errors, timeouts, HTTP 429
//! and 5xx. Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::AdapterError;

/// Ceiling for a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Transport failures, timeouts, throttling (429) and 5xx responses.
pub(crate) fn is_retriable(err: &AdapterError) -> bool {
    match err {
        AdapterError::Http(e) if e.is_timeout() || e.is_connect() => true,
        AdapterError::Http(e) => e.status().is_some_and(|s| s.is_server_error()),
        AdapterError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        AdapterError::Deserialize { .. }
        | AdapterError::InvalidUrl { .. }
        | AdapterError::MissingContent { .. }
        | AdapterError::NotConfigured(_) => false,
    }
}

/// Un-jittered wait before retry number `attempt` (1-based): the base
/// doubles each time and saturates at [`MAX_DELAY`].
fn nominal_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(10);
    Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_DELAY)
}

/// Scales `delay` by a random factor in `[0.75, 1.25)`.
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.75 + rand::random::<f64>() * 0.5)
}

/// Calls `operation` until it succeeds, fails permanently, or has been
/// retried `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries >= max_retries || !is_retriable(&err) => return Err(err),
            Err(err) => err,
        };
        retries += 1;
        let delay = jittered(nominal_delay(backoff_base_ms, retries));
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "adapter call failed transiently; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
