use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Priority of a queued broker call; unused today but kept so a future
/// exit-vs-entry priority split doesn't require a signature change.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Priority {
    High,
    Normal,
}

struct Inner {
    base_interval: Duration,
    current_interval: Duration,
    max_interval: Duration,
    last_call: Instant,
}

/// Bounded exponential backoff for transient broker errors (spec.md §7).
///
/// Each [`RateLimiter::wait`] call blocks until `current_interval` has
/// elapsed since the previous call. A [`RateLimiter::report_violation`]
/// doubles the interval up to `max_interval`; [`RateLimiter::reset`] restores
/// the base interval once a call succeeds.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

impl RateLimiter {
    pub fn new(base_interval: Duration, max_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                base_interval,
                current_interval: base_interval,
                max_interval,
                last_call: Instant::now() - base_interval,
            })),
        }
    }

    /// Wait out the remainder of the current backoff interval, at the given
    /// [`Priority`] (reserved for future use - both priorities share one
    /// interval today).
    pub async fn wait(&self, _priority: Priority) {
        let (elapsed, interval) = {
            let inner = self.inner.lock().await;
            (inner.last_call.elapsed(), inner.current_interval)
        };
        if elapsed < interval {
            sleep(interval - elapsed).await;
        }
        self.inner.lock().await.last_call = Instant::now();
    }

    pub async fn report_violation(&self) {
        let mut inner = self.inner.lock().await;
        inner.current_interval = std::cmp::min(inner.current_interval * 2, inner.max_interval);
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.current_interval = inner.base_interval;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn violation_doubles_interval_until_capped() {
        let rl = RateLimiter::new(Duration::from_millis(10), Duration::from_millis(30));
        rl.report_violation().await;
        rl.report_violation().await;
        rl.report_violation().await;
        let interval = rl.inner.lock().await.current_interval;
        assert_eq!(interval, Duration::from_millis(30));
    }

    #[tokio::test]
    async fn reset_restores_base_interval() {
        let rl = RateLimiter::new(Duration::from_millis(5), Duration::from_millis(40));
        rl.report_violation().await;
        rl.reset().await;
        let interval = rl.inner.lock().await.current_interval;
        assert_eq!(interval, Duration::from_millis(5));
    }
}
