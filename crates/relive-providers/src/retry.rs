//! Retry with exponential backoff for provider requests.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

const BASE_DELAY_MS: u64 = 500;
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Wait before retry number `attempt + 1`, capped at 30 s.
fn backoff_delay(attempt: u32) -> Duration {
    let ms = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(ms).min(MAX_DELAY)
}

/// Run `operation` up to `max_retries + 1` times while it fails with a
/// retryable error, backing off exponentially from 500 ms between attempts.
pub(crate) async fn with_retry<F, Fut, T>(max_retries: u32, what: &str, operation: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(attempt);
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    what,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
