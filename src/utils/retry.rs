// Retry with exponential backoff for transient upstream failures

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run `operation`, retrying up to `max_retries` extra times while `is_retryable` holds.
///
/// The delay doubles on each attempt starting from `base_delay`.
pub async fn with_retry<F, Fut, T, E, R>(
    mut operation: F,
    max_retries: u32,
    base_delay: Duration,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= max_retries || !is_retryable(&error) {
                    return Err(error);
                }
                attempt += 1;

                let delay = base_delay * 2u32.pow((attempt - 1).min(5));
                warn!(attempt, error = %error, delay_ms = delay.as_millis() as u64, "Retrying after transient failure");
                sleep(delay).await;
            }
        }
    }
}
