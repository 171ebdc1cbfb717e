//! Wait mechanisms for synchronization.
//!
//! One primitive, [`poll_until`], re-checks an asynchronous condition at a
//! bounded interval. The sleep before each re-check is clamped to the time
//! left, so a condition that never holds fails no earlier than the timeout
//! and no later than the timeout plus one poll interval.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was checked
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// How a poll loop ended, when `check` itself never failed
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The condition held
    Satisfied(WaitResult),
    /// The timeout elapsed first
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
        /// Number of times the condition was checked
        attempts: u32,
    },
}

/// Poll `check` until it yields `true` or the timeout elapses, reporting the
/// loop's own timeout as [`WaitOutcome::TimedOut`].
///
/// Errors from `check` end the wait immediately and are returned as they
/// are, including a [`ProbeError::Timeout`] raised inside `check`.
///
/// # Errors
///
/// The first error returned by `check`.
pub async fn poll<F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut check: F,
) -> ProbeResult<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        if check().await? {
            let elapsed = start.elapsed();
            debug!(waited_for, attempts, ?elapsed, "wait condition satisfied");
            return Ok(WaitOutcome::Satisfied(WaitResult {
                elapsed,
                attempts,
                waited_for: waited_for.to_string(),
            }));
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            warn!(waited_for, attempts, timeout_ms = options.timeout_ms, "wait timed out");
            return Ok(WaitOutcome::TimedOut { elapsed, attempts });
        }

        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// Poll `check` until it yields `true` or the timeout elapses.
///
/// Errors from `check` end the wait immediately.
///
/// # Errors
///
/// Returns [`ProbeError::Timeout`] when the condition never held, or the
/// first error returned by `check`.
pub async fn poll_until<F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    check: F,
) -> ProbeResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    match poll(options, waited_for, check).await? {
        WaitOutcome::Satisfied(result) => Ok(result),
        WaitOutcome::TimedOut { .. } => Err(ProbeError::Timeout {
            ms: options.timeout_ms,
            waited_for: waited_for.to_string(),
        }),
    }
}
