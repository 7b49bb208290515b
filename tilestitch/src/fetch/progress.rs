//! Progress reporting for a stitching run.
//!
//! Workers and the reassembly sink update shared atomic counters. Every
//! update is forwarded to an optional observer (the CLI progress bar), and
//! every `interval` completions a log line is written.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

/// Callback receiving a snapshot after every counter change.
pub type ProgressObserver = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Tiles in the run.
    pub total: usize,
    /// Tiles fetched successfully.
    pub fetched: usize,
    /// Tiles painted onto the canvas.
    pub painted: usize,
    /// Refused responses seen so far.
    pub throttled: u64,
    /// Tile body bytes downloaded.
    pub bytes: u64,
}

impl ProgressSnapshot {
    /// Fraction of tiles painted, 0.0 - 1.0.
    pub fn fraction_painted(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.painted as f64 / self.total as f64
    }
}

/// Shared progress counters for one run.
pub struct ProgressCounters {
    total: usize,
    interval: usize,
    fetched: AtomicUsize,
    painted: AtomicUsize,
    throttled: AtomicU64,
    bytes: AtomicU64,
    observer: Option<ProgressObserver>,
}

impl fmt::Debug for ProgressCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCounters")
            .field("snapshot", &self.snapshot())
            .field("interval", &self.interval)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ProgressCounters {
    /// Creates counters for `total` tiles, logging every `interval` completions.
    pub fn new(total: usize, interval: usize) -> Self {
        Self {
            total,
            interval: interval.max(1),
            fetched: AtomicUsize::new(0),
            painted: AtomicUsize::new(0),
            throttled: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            observer: None,
        }
    }

    /// Attaches an observer.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Records a successful fetch of `bytes` bytes.
    pub fn record_fetched(&self, bytes: usize) {
        self.bytes.fetch_add(bytes as u64, Ordering::SeqCst);
        let fetched = self.fetched.fetch_add(1, Ordering::SeqCst) + 1;
        if fetched % self.interval == 0 {
            info!(fetched, total = self.total, "Downloaded {} image parts...", fetched);
        }
        self.notify();
    }

    /// Records a refused response.
    pub fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::SeqCst);
        self.notify();
    }

    /// Records a tile painted onto the canvas.
    pub fn record_painted(&self) {
        let painted = self.painted.fetch_add(1, Ordering::SeqCst) + 1;
        if painted % self.interval == 0 {
            info!(painted, total = self.total, "Stitched {} image parts", painted);
        }
        self.notify();
    }

    /// Current counter values.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            fetched: self.fetched.load(Ordering::SeqCst),
            painted: self.painted.load(Ordering::SeqCst),
            throttled: self.throttled.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
        }
    }

    fn notify(&self) {
        if let Some(ref observer) = self.observer {
            observer(self.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_counters_new() {
        let counters = ProgressCounters::new(4, 100);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.fetched, 0);
        assert_eq!(snapshot.painted, 0);
        assert_eq!(snapshot.bytes, 0);
    }

    #[test]
    fn test_record_events() {
        let counters = ProgressCounters::new(4, 2);

        counters.record_fetched(500);
        counters.record_fetched(300);
        counters.record_throttled();
        counters.record_painted();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.fetched, 2);
        assert_eq!(snapshot.bytes, 800);
        assert_eq!(snapshot.throttled, 1);
        assert_eq!(snapshot.painted, 1);
        assert!((snapshot.fraction_painted() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_observer_sees_every_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let observer: ProgressObserver = Arc::new(move |s: ProgressSnapshot| {
            seen_clone.lock().push(s);
        });
        let counters = ProgressCounters::new(2, 100).with_observer(observer);

        counters.record_fetched(10);
        counters.record_painted();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].fetched, 1);
        assert_eq!(seen[1].painted, 1);
    }

    #[test]
    fn test_fraction_with_no_tiles() {
        let counters = ProgressCounters::new(0, 1);
        assert_eq!(counters.snapshot().fraction_painted(), 1.0);
    }
}
