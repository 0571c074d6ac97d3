//! Retry with exponential backoff for listing page fetches.
//!
//! Only transient conditions (HTTP 429, network failures, 5xx) are retried.
//! Everything else is surfaced on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth another attempt after a pause.
///
/// Retriable:
/// - [`ScraperError::RateLimited`]: the marketplace asked us to back off.
/// - [`ScraperError::Http`]: connection reset, timeout, TLS hiccup.
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
///
/// Not retriable: 404s, other 4xx statuses, invalid URLs, selector problems.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation`, retrying transient failures up to `max_retries`
/// additional times.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds. A rate-limit response with a shorter `Retry-After` does not
/// shorten the wait; a longer one is honoured up to 60 seconds.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let mut delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        if let ScraperError::RateLimited {
            retry_after_secs, ..
        } = &err
        {
            delay_secs = delay_secs.max((*retry_after_secs).min(60));
        }

        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
