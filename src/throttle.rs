//! Rate limiting for outbound image lookups.
//!
//! The limiter knows nothing about lookups; [`crate::api::ThrottledLookup`]
//! asks it for a permit before every call and reports back once the call has
//! finished. Swapping in another strategy means implementing [`RateLimiter`].

use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Something that decides when the next request may go out.
pub trait RateLimiter {
    /// Wait until a request is allowed.
    async fn acquire(&self);

    /// The request allowed by the last [`acquire`](Self::acquire) has finished.
    async fn release(&self) {}
}

/// Keeps a fixed pause of `interval` between consecutive requests.
///
/// The first permit is immediate. Each later permit waits until `interval`
/// has passed since the previous request was released, so slow requests do
/// not eat into the pause. Without a release the pause counts from the
/// previous grant.
pub struct FixedInterval {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Debug for FixedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedInterval")
            .field("interval", &self.interval)
            .finish()
    }
}

impl RateLimiter for FixedInterval {
    async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let next = prev + self.interval;
            if next > Instant::now() {
                trace!(wait = ?(next - Instant::now()), "Throttling");
                sleep_until(next).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn release(&self) {
        *self.last.lock().await = Some(Instant::now());
    }
}
