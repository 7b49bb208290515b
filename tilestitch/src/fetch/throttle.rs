//! Shared throttle cool-down.
//!
//! Without coordination each worker discovers throttling on its own and keeps
//! sending requests until it is refused. When enabled, a `ThrottleGate` lets
//! one refused worker hold back every other worker until the cool-down ends.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Stand-in deadline for delays too large to represent, about 30 years out.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cool-down shared by all workers of a run.
#[derive(Debug)]
pub struct ThrottleGate {
    enabled: bool,
    cool_down_until: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    /// Creates a gate. A disabled gate never blocks.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cool_down_until: Mutex::new(None),
        }
    }

    /// Whether throttle signals are shared between workers.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a throttle response; other workers wait at least `delay`.
    ///
    /// An existing later deadline is kept.
    pub fn trip(&self, delay: Duration) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        let until = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let mut guard = self.cool_down_until.lock();
        if guard.map_or(true, |current| current < until) {
            *guard = Some(until);
        }
    }

    /// Remaining cool-down, if any.
    pub fn remaining(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let until = (*self.cool_down_until.lock())?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    /// Waits out the current cool-down.
    ///
    /// Returns false if `cancel` fired first.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        // Re-check after sleeping: another worker may have extended it
        while let Some(remaining) = self.remaining() {
            debug!(remaining_ms = remaining.as_millis() as u64, "Waiting for shared cool-down");
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(remaining) => {}
            }
        }
        !cancel.is_cancelled()
    }
}
