//! Bounded retry policy for provider loops.
//!
//! PayPal's invoice creation is asynchronous on the provider side: after
//! create, the invoice has to be polled until readable, and the send call
//! can transiently fail while the invoice settles. Both loops are bounded
//! and share this policy so their limits are testable in one place.

use std::future::Future;
use std::time::Duration;

/// A fixed-delay retry budget: up to `max_attempts` tries with `delay`
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// A policy with `max_attempts` tries, one second apart - the spacing
    /// both PayPal loops use.
    #[must_use]
    pub const fn every_second(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_secs(1),
        }
    }

    /// Runs `operation` until it succeeds or the budget is exhausted.
    ///
    /// Returns the first `Ok`, or the error from the final attempt. The
    /// budget is non-cancelable once started - the loop always runs to
    /// success or exhaustion.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => return Err(err),
                Err(_) => {
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
