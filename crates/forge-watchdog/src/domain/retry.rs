//! Bounded retry executor.
//!
//! Runs a unit of work until it succeeds, asks to stop, or hits the attempt
//! ceiling. Only the calling task is suspended between attempts.
//!
//! ```text
//! attempt 1 ──ok──→ Success { attempts_used: 1 }
//!     │
//!     └──err(retry)──→ sleep(delay) ──→ attempt 2 ──→ ...
//!                                                   │
//!               err(abort) or attempt == max ──→ RetryExhausted
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Attempt ceiling for general use
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Attempt ceiling while waiting for the node API after a restart
pub const READINESS_MAX_ATTEMPTS: u32 = 10;

/// Delay between readiness probes
pub const READINESS_DELAY: Duration = Duration::from_secs(10);

/// Attempt ceiling and inter-attempt delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of invocations, never less than one
    pub max_attempts: u32,
    /// Sleep between a failed attempt and the next one
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; a zero ceiling is raised to one attempt
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    /// General purpose policy: 50 attempts, no delay
    pub const fn general() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::ZERO)
    }

    /// Readiness polling: 10 attempts, 10 seconds apart
    pub const fn readiness() -> Self {
        Self::new(READINESS_MAX_ATTEMPTS, READINESS_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::general()
    }
}

/// Failure of a single attempt
#[derive(Debug)]
pub struct AttemptError<E> {
    /// Observed error
    pub error: E,
    /// Whether another attempt is allowed
    pub retry: bool,
}

impl<E> AttemptError<E> {
    /// Failure that permits another attempt
    pub fn retry(error: E) -> Self {
        Self { error, retry: true }
    }

    /// Failure that stops the executor immediately
    pub fn abort(error: E) -> Self {
        Self {
            error,
            retry: false,
        }
    }
}

/// Successful result of a retried unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    /// Value produced by the successful attempt
    pub value: T,
    /// Invocations performed, including the successful one
    pub attempts_used: u32,
}

/// The executor gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Invocations performed
    pub attempts: u32,
    /// Error reported by the last attempt
    pub last_error: E,
}

/// Invoke `work` with the 1-based attempt number until it succeeds, aborts,
/// or `policy.max_attempts` invocations have been made.
pub async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    mut work: F,
) -> Result<RetryOutcome<T>, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError<E>>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match work(attempt).await {
            Ok(value) => {
                return Ok(RetryOutcome {
                    value,
                    attempts_used: attempt,
                })
            }
            Err(AttemptError { error, retry }) => {
                if !retry || attempt >= policy.max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: error,
                    });
                }
                debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "Attempt failed, retrying"
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
