use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A broker call exceeded its caller-supplied deadline. Per spec.md §5 this
/// is treated as a missing tick / still-pending order for that cycle, never
/// as a synthesized result.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[error("operation exceeded deadline of {0:?}")]
pub struct DeadlineError(pub Duration);

/// Run `fut` and fail with [`DeadlineError`] if it doesn't resolve within
/// `deadline`. Every broker call and journal commit in this core is wrapped
/// with this helper so a slow I/O call can never stall the engine loop's
/// cadence.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, DeadlineError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineError(deadline))
}
