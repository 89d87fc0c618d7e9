//! Bounded retry with exponential backoff for outbound requests

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op` up to `attempts` times, doubling the backoff between tries.
/// The last error is returned unchanged; callers map it to their port's
/// retries-exceeded variant.
pub async fn with_retries<T, E, Fut, F>(
    attempts: usize,
    base_backoff: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut backoff = base_backoff;
    for attempt in 1..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, error = %e, "request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }
    op().await
}
