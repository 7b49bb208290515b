//! Concurrent tile fetching.
//!
//! Workers share a [`WorkQueue`] seeded before they start, retry refused
//! tiles under a [`RetryPolicy`], optionally coordinate through a
//! [`ThrottleGate`], and report to [`ProgressCounters`].

mod progress;
mod queue;
mod retry;
mod throttle;
mod worker;

pub use progress::{ProgressCounters, ProgressObserver, ProgressSnapshot};
pub use queue::WorkQueue;
pub use retry::{RetryPolicy, DEFAULT_RETRY_DELAY_SECS};
pub use throttle::ThrottleGate;
pub use worker::{FetchWorker, WorkerContext, WorkerSettings, WorkerSummary};
