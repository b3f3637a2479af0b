//! Retry with exponential backoff for a single provider request

use std::time::Duration;

use crate::error::FetchError;

/// Base delay for the first retry
const BASE_DELAY: Duration = Duration::from_secs(2);

/// Exponential backoff: 2s, 4s, 8s, ... for attempt 0, 1, 2, ...
pub fn backoff_duration(attempt: u32) -> Duration {
    BASE_DELAY * 2u32.saturating_pow(attempt)
}

/// Retry a fallible request while its error is retryable.
///
/// Only transient transport failures (429, 5xx, timeouts) are repeated,
/// at most `max_retries` times. `sleep` is injected so callers can make the
/// wait cancellation-aware; it returns `true` to abandon the remaining retries.
pub fn retry_with_backoff<T>(
    label: &str,
    max_retries: u32,
    mut sleep: impl FnMut(Duration) -> bool,
    mut attempt_fn: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                let delay = backoff_duration(attempt);
                attempt += 1;
                log::debug!("{label}: attempt {attempt}/{max_retries} failed: {e}, retry in {delay:?}");
                if sleep(delay) {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
}
