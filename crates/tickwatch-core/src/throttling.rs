use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared courtesy pacer for upstream feed calls.
///
/// Clones share one budget, so every feed holding a clone is spaced against
/// the same clock. A zero spacing disables pacing entirely.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    spacing: Duration,
}

impl RequestPacer {
    pub fn new(spacing: Duration) -> Self {
        let limiter = Quota::with_period(spacing)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter, spacing }
    }

    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until the next upstream call is allowed.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Non-blocking variant of [`Self::ready`]; `false` when a call now
    /// would break the spacing.
    pub fn try_ready(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("spacing", &self.spacing)
            .finish()
    }
}
