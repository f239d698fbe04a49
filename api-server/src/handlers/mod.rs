//! HTTP handlers

pub mod health;
pub mod models;
pub mod predict;
pub mod status;

use std::time::Duration;

use textclf_core::ServiceError;

use crate::AppError;

/// Run blocking core work off the async runtime, bounded by `timeout_ms`.
/// On timeout the worker is left to finish in the background.
pub(crate) async fn run_blocking<T, F>(timeout_ms: u64, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(joined) => Ok(joined?),
        Err(_) => Err(ServiceError::Timeout(timeout_ms).into()),
    }
}
