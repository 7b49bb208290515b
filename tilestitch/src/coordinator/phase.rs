//! Run lifecycle.

use std::fmt;

use tracing::info;

/// Lifecycle of a stitching run.
///
/// ```text
/// Idle ─► Partitioning ─► Fetching ─► Draining ─► Complete
///                            │            │
///                            └────────────┴─────► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing has been scheduled yet.
    Idle,
    /// Computing the tile grid.
    Partitioning,
    /// Workers are draining the queue.
    Fetching,
    /// Every worker has exited; the sink is painting the remaining results.
    Draining,
    /// The canvas is finished.
    Complete,
    /// The run was cancelled or failed.
    Aborted,
}

impl RunPhase {
    /// Moves to `next`, logging the transition.
    pub fn advance(&mut self, next: RunPhase) {
        info!(from = %self, to = %next, "Run phase changed");
        *self = next;
    }

    /// Returns true for phases a run never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Aborted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Partitioning => "partitioning",
            RunPhase::Fetching => "fetching",
            RunPhase::Draining => "draining",
            RunPhase::Complete => "complete",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut phase = RunPhase::Idle;
        phase.advance(RunPhase::Partitioning);
        assert_eq!(phase, RunPhase::Partitioning);
        assert!(!phase.is_terminal());

        phase.advance(RunPhase::Complete);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(RunPhase::Draining.to_string(), "draining");
        assert_eq!(RunPhase::Aborted.to_string(), "aborted");
    }
}
