//! Retry policy for refused tile requests.
//!
//! A tile that comes back with any non-success status is retried after a
//! fixed delay. There is no backoff. By default there is also no attempt
//! ceiling: the server is trusted to lift throttling eventually.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tilestitch::fetch::RetryPolicy;
//!
//! // Unbounded, three minutes between attempts
//! let policy = RetryPolicy::default();
//! assert!(policy.allows_attempt(1_000));
//!
//! // Give up after five attempts
//! let bounded = RetryPolicy::fixed(Duration::from_secs(10)).with_max_attempts(5);
//! assert!(!bounded.allows_attempt(6));
//! ```

use std::time::Duration;

/// Default delay after a refused tile request (3 minutes).
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 180;

/// Fixed-delay retry policy with an optional attempt ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between attempts.
    pub delay: Duration,
    /// Maximum number of attempts (including the first). `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(DEFAULT_RETRY_DELAY_SECS))
    }
}

impl RetryPolicy {
    /// Creates an unbounded policy with the given delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Sets an attempt ceiling. Zero is treated as one attempt.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Returns true if attempt number `attempt` (1-based) may be made.
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt <= max,
            None => true,
        }
    }

    /// Returns true if this policy never gives up.
    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none()
    }
}
