//! Retry policy — pure mapping from a failure to a re-attempt decision.
//!
//! The policy itself is stateless; exponential growth is driven by the
//! owning job unit's retry counter, so back-off is per-job, not global.

use std::time::Duration;

/// Behaviour for retrying a failed job attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a fixed delay. Zero retries as soon as the executor
    /// can schedule it.
    Retry { delay: Duration },
    /// No further attempts; the job moves to terminal-cancelled and its
    /// removal callback fires immediately.
    Cancel,
    /// Exponential back-off: first retry after `initial`, doubling on
    /// each subsequent retry, unbounded.
    Exponential { initial: Duration },
    /// Exponential back-off clamped to `max_delay`.
    ExponentialWithLimit { initial: Duration, max_delay: Duration },
}

impl RetryDecision {
    /// Delay before the `retry_index`-th retry (1-based), or `None` when
    /// the decision is to stop retrying.
    pub fn delay_for(&self, retry_index: u32) -> Option<Duration> {
        match *self {
            RetryDecision::Cancel => None,
            RetryDecision::Retry { delay } => Some(delay),
            RetryDecision::Exponential { initial } => Some(backoff(initial, retry_index, None)),
            RetryDecision::ExponentialWithLimit { initial, max_delay } => {
                Some(backoff(initial, retry_index, Some(max_delay)))
            }
        }
    }
}

/// `initial * 2^(retry_index - 1)`, saturating, optionally clamped.
fn backoff(initial: Duration, retry_index: u32, cap: Option<Duration>) -> Duration {
    let doublings = retry_index.saturating_sub(1);
    let factor = 2u32.saturating_pow(doublings);
    let delay = initial.saturating_mul(factor);
    match cap {
        Some(max_delay) => delay.min(max_delay),
        None => delay,
    }
}
