//! Bounded retry shared by the history retriever and the push transport.
//!
//! Policies count total attempts, the way `history.max_attempts` is stated
//! in configuration, so `3` means one call plus two retries.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Pause schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same pause before every retry.
    Constant(Duration),
    /// `initial * 2^retry`, capped at `cap`, optionally jittered by +/- 50%.
    Doubling {
        initial: Duration,
        cap: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Doubling {
            initial: Duration::from_millis(500),
            cap: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Pause before retry number `retry` (0-based).
    pub fn delay(self, retry: u32) -> Duration {
        match self {
            Self::Constant(pause) => pause,
            Self::Doubling {
                initial,
                cap,
                jitter,
            } => {
                let doubled = initial
                    .checked_mul(2_u32.saturating_pow(retry.min(31)))
                    .unwrap_or(cap);
                let capped = doubled.min(cap);
                if jitter {
                    spread(capped)
                } else {
                    capped
                }
            }
        }
    }
}

/// Uniform pick in `[delay / 2, delay * 3 / 2]`.
fn spread(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX / 2);
    let half = millis / 2;
    Duration::from_millis(half + fastrand::u64(0..=millis))
}

/// How often, and how patiently, a failing call is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first; treated as at least 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// HTTP statuses that are worth another attempt.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::doubling(3)
    }
}

impl RetryConfig {
    /// Jittered doubling backoff from 500 ms up to 4 s.
    pub fn doubling(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::default(),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    pub fn constant(pause: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Constant(pause),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    /// A single attempt.
    pub fn once() -> Self {
        Self::constant(Duration::ZERO, 1)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Calls `operation` with the 1-based attempt number until it succeeds,
    /// fails with an error `is_retryable` rejects, or attempts run out.
    ///
    /// The last error is returned when every attempt fails.
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if attempt >= attempts || !is_retryable(&err) {
                return Err(err);
            }

            let pause = self.backoff.delay(attempt - 1);
            debug!(attempt, attempts, pause_ms = pause.as_millis() as u64, "attempt failed, retrying");
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            attempt += 1;
        }
    }
}
