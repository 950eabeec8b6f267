use crate::domain::error::Result;
use std::future::Future;
use tracing::warn;

/// Runs `operation`, and on a retryable failure runs it exactly once more.
/// The second error is returned unchanged.
pub(crate) async fn with_single_retry<T, F, Fut>(label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(e) if e.is_retryable() => {
            warn!("{} failed, retrying once: {}", label, e);
            operation().await
        }
        Err(e) => Err(e),
    }
}
