//! Retry policy for semantic index queries.
//!
//! Transient failures are retried with doubling delays. Retrying stops at
//! the attempt limit, on a permanent error, or when the next delay would
//! run past the deadline the scanner gave the query.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{Error, Result};

/// How often and how patiently a semantic index query is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRetry {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay before the second attempt
    pub first_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for IndexRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            first_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl IndexRetry {
    pub fn new(attempts: u32, first_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            first_delay,
            max_delay,
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.first_delay
            .saturating_mul(1 << doublings)
            .min(self.max_delay)
    }

    /// Run `call` until it succeeds or retrying is no longer allowed.
    ///
    /// `call` receives the 1-based attempt number. With a `deadline`, no
    /// retry is scheduled that would start after it.
    pub async fn run<T, F, Fut>(&self, deadline: Option<Instant>, mut call: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let error = match call(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Semantic index recovered");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if attempt >= self.attempts || !error.is_retriable() {
                return Err(error);
            }

            let delay = self.delay_after(attempt);
            if deadline.is_some_and(|deadline| Instant::now() + delay >= deadline) {
                debug!(attempt, "No time left to retry the semantic index");
                return Err(error);
            }

            debug!(
                attempt,
                status = status_of(&error),
                delay_ms = delay.as_millis() as u64,
                "Semantic index query failed, retrying: {}",
                error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn status_of(error: &Error) -> Option<u16> {
    match error {
        Error::Api { status, .. } => Some(*status),
        Error::Http(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    }
}
