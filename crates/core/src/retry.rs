use std::future::Future;
use tracing::warn;

use crate::error::RetriesExhausted;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// Attempts run back-to-back with no backoff; latency grows linearly with the
// attempt limit.
pub async fn retry<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    label: &str,
) -> Result<T, RetriesExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!(operation = label, attempt, error = %error, "attempt failed");
                if attempt == max_attempts {
                    return Err(RetriesExhausted {
                        operation: label.to_string(),
                        attempts: max_attempts,
                        source: Box::new(error),
                    });
                }
                attempt += 1;
            }
        }
    }
}

pub async fn retry_unit<E, F, Fut>(
    operation: F,
    max_attempts: u32,
    label: &str,
) -> Result<(), RetriesExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    retry(operation, max_attempts, label).await
}
