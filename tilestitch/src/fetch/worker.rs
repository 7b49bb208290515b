//! Fetch worker.
//!
//! A worker pops tiles from the shared [`WorkQueue`] until it is empty. For
//! each tile it resolves the address, requests it, and retries the same tile
//! after a fixed delay for as long as the server refuses it. Successful
//! bodies go to the results channel as [`TileResult`]s.
//!
//! ```text
//!   ┌──────────┐  pop   ┌───────────┐  GET   ┌────────┐
//!   │WorkQueue │──────► │FetchWorker│──────► │ server │
//!   └──────────┘        └─────┬─────┘ ◄──────└────────┘
//!                             │ 2xx        non-2xx: sleep, retry same tile
//!                             ▼
//!                       results channel
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{ProgressCounters, RetryPolicy, ThrottleGate, WorkQueue};
use crate::config::StitchConfig;
use crate::error::{StitchError, StitchResult};
use crate::locator::TileLocator;
use crate::provider::AsyncHttpClient;
use crate::tile::{TileDescriptor, TileResult};

/// Per-worker timing and retry settings.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerSettings {
    /// Pause before each queue pop.
    pub request_delay: Duration,
    /// Retry behaviour for refused requests.
    pub retry: RetryPolicy,
    /// Consecutive transport faults tolerated on one tile.
    pub transport_failure_limit: u32,
}

impl WorkerSettings {
    /// Extracts worker settings from a run configuration.
    pub fn from_config(config: &StitchConfig) -> Self {
        Self {
            request_delay: config.request_delay,
            retry: config.retry.clone(),
            transport_failure_limit: config.transport_failure_limit.max(1),
        }
    }
}

/// State shared by all workers of a run.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<WorkQueue>,
    pub locator: Arc<TileLocator>,
    pub results: mpsc::UnboundedSender<TileResult>,
    pub progress: Arc<ProgressCounters>,
    pub throttle: Arc<ThrottleGate>,
    pub settings: WorkerSettings,
    pub cancel: CancellationToken,
}

/// What one worker did before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Worker index.
    pub worker: usize,
    /// Tiles delivered to the results channel.
    pub tiles: usize,
    /// Refused responses received.
    pub throttled: u64,
    /// Transport faults seen.
    pub transport_faults: u64,
    /// Retry delays slept.
    pub retries: u64,
}

/// One concurrent fetch unit.
///
/// Owns its HTTP client for its whole lifetime; the client is dropped when
/// [`run`](Self::run) returns.
pub struct FetchWorker<C> {
    id: usize,
    client: C,
    ctx: WorkerContext,
}

impl<C: AsyncHttpClient> FetchWorker<C> {
    /// Creates a worker.
    pub fn new(id: usize, client: C, ctx: WorkerContext) -> Self {
        Self { id, client, ctx }
    }

    /// Worker index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Drains the queue.
    ///
    /// Returns once the queue is empty. Fails on cancellation, on an
    /// exhausted retry ceiling, or on repeated transport faults.
    #[instrument(name = "fetch_worker", skip(self), fields(worker = self.id))]
    pub async fn run(self) -> StitchResult<WorkerSummary> {
        let mut summary = WorkerSummary {
            worker: self.id,
            ..WorkerSummary::default()
        };

        loop {
            if !self.pause(self.ctx.settings.request_delay).await {
                return Err(StitchError::Cancelled);
            }

            let Some(tile) = self.ctx.queue.pop() else {
                break;
            };

            let bytes = self.fetch_tile(&tile, &mut summary).await?;
            self.ctx.progress.record_fetched(bytes.len());

            if self.ctx.results.send(TileResult::new(tile, bytes)).is_err() {
                return Err(StitchError::Worker(format!(
                    "worker {} could not deliver tile {}: reassembly stopped",
                    self.id, tile
                )));
            }
            summary.tiles += 1;
        }

        debug!(
            worker = self.id,
            tiles = summary.tiles,
            throttled = summary.throttled,
            "Work queue empty, worker exiting"
        );
        Ok(summary)
    }

    /// Fetches one tile, retrying until it succeeds or the policy gives up.
    async fn fetch_tile(
        &self,
        tile: &TileDescriptor,
        summary: &mut WorkerSummary,
    ) -> StitchResult<Vec<u8>> {
        let settings = &self.ctx.settings;
        let address = self.ctx.locator.locate(tile);
        let mut attempt: u32 = 0;
        let mut consecutive_faults: u32 = 0;

        loop {
            attempt += 1;

            if !self.ctx.throttle.wait(&self.ctx.cancel).await {
                return Err(StitchError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = self.ctx.cancel.cancelled() => return Err(StitchError::Cancelled),
                outcome = self.client.get(address.as_str()) => outcome,
            };

            match outcome {
                Ok(response) if response.is_success() => {
                    debug!(
                        worker = self.id,
                        x = tile.x(),
                        y = tile.y(),
                        attempt,
                        bytes = response.body.len(),
                        "Tile fetched"
                    );
                    return Ok(response.body);
                }
                Ok(response) => {
                    consecutive_faults = 0;
                    summary.throttled += 1;
                    self.ctx.progress.record_throttled();
                    self.ctx.throttle.trip(settings.retry.delay);
                    info!(
                        worker = self.id,
                        x = tile.x(),
                        y = tile.y(),
                        status = response.status,
                        attempt,
                        "Sleeping for {} seconds due to rate-limiting",
                        settings.retry.delay.as_secs_f64()
                    );
                }
                Err(e) => {
                    consecutive_faults += 1;
                    summary.transport_faults += 1;
                    warn!(
                        worker = self.id,
                        x = tile.x(),
                        y = tile.y(),
                        attempt,
                        consecutive_faults,
                        error = %e,
                        "Transport fault"
                    );
                    if consecutive_faults >= settings.transport_failure_limit {
                        return Err(StitchError::Unrecoverable {
                            worker: self.id,
                            reason: format!("tile {}: {}", tile, e),
                        });
                    }
                }
            }

            if !settings.retry.allows_attempt(attempt + 1) {
                return Err(StitchError::RetriesExhausted {
                    x: tile.x(),
                    y: tile.y(),
                    attempts: attempt,
                });
            }

            summary.retries += 1;
            if !self.pause(settings.retry.delay).await {
                return Err(StitchError::Cancelled);
            }
        }
    }

    /// Sleeps for `delay`. Returns false if cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.ctx.cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = self.ctx.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
