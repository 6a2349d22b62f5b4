//! Bounded waits.
//!
//! Every wait carries a timeout. Expiry is a hard [`SeatError::Timeout`];
//! nothing here retries the action that was being waited on.

use crate::result::{SeatError, SeatResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for attribute flips (5 seconds)
pub const DEFAULT_ATTRIBUTE_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for visibility waits (10 seconds)
pub const DEFAULT_VISIBLE_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for network responses (10 seconds)
pub const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a wait result
    #[must_use]
    pub fn new(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `check` until it yields `true` or `timeout` elapses.
///
/// The check runs at least once, so a zero timeout still observes the
/// current state. Errors from `check` abort the wait immediately.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    waited_for: impl Into<String>,
    mut check: F,
) -> SeatResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SeatResult<bool>>,
{
    let waited_for = waited_for.into();
    let start = Instant::now();

    loop {
        if check().await? {
            return Ok(WaitResult::new(start.elapsed(), waited_for));
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(SeatError::timeout(duration_ms(timeout), waited_for));
        }
        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// Sleep between sequential clicks. A zero duration returns immediately.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Milliseconds, saturating at `u64::MAX`
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
