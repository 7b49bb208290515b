//! Run coordinator.
//!
//! Drives one stitching run from partitioning to the finished canvas:
//!
//! 1. Partition the image into tiles and seed the shared work queue.
//! 2. Start the reassembly sink on the blocking pool.
//! 3. Spawn `workers` fetch workers, each with its own HTTP client.
//! 4. Wait for every worker to drain the queue.
//! 5. Wait for the sink to paint the last tile.
//!
//! A fatal worker error, a sink failure or an external cancel stops the run.
//! Shutdown is two-phase: the run token is cancelled and workers get
//! `shutdown_grace` to exit on their own, then whatever remains is aborted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::RunPhase;
use crate::assembly::{Canvas, ReassemblySink};
use crate::config::StitchConfig;
use crate::error::{StitchError, StitchResult};
use crate::fetch::{
    FetchWorker, ProgressCounters, ProgressObserver, ThrottleGate, WorkQueue, WorkerContext,
    WorkerSettings, WorkerSummary,
};
use crate::locator::{ResourceId, TileLocator};
use crate::provider::HttpClientFactory;
use crate::tile::partition;

/// What to stitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchRequest {
    pub resource: ResourceId,
    pub width: u32,
    pub height: u32,
}

impl StitchRequest {
    pub fn new(resource: ResourceId, width: u32, height: u32) -> Self {
        Self {
            resource,
            width,
            height,
        }
    }
}

/// Statistics for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Tiles painted.
    pub tiles: usize,
    /// Refused responses seen across all workers.
    pub throttled: u64,
    /// Tile body bytes downloaded.
    pub bytes: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Per-worker summaries, in completion order.
    pub workers: Vec<WorkerSummary>,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct StitchOutcome {
    pub canvas: Canvas,
    pub report: RunReport,
}

type WorkerSet = JoinSet<StitchResult<WorkerSummary>>;

/// Runs stitching jobs with a fixed configuration and client factory.
pub struct RunCoordinator<F> {
    config: StitchConfig,
    factory: F,
    observer: Option<ProgressObserver>,
}

impl<F: HttpClientFactory> RunCoordinator<F> {
    pub fn new(config: StitchConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            observer: None,
        }
    }

    /// Forwards every progress update to `observer`.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Runs one stitching job to completion.
    ///
    /// Cancelling `cancel` stops the run with [`StitchError::Cancelled`]. No
    /// partial canvas is returned on any failure.
    pub async fn run(
        &self,
        request: StitchRequest,
        cancel: CancellationToken,
    ) -> StitchResult<StitchOutcome> {
        let started = Instant::now();
        let mut phase = RunPhase::Idle;

        self.config.validate()?;

        phase.advance(RunPhase::Partitioning);
        let tiles = partition(request.width, request.height, self.config.tile_size)?;
        let expected = tiles.len();

        // Create every client up front so a factory failure leaves nothing to clean up
        let clients = (0..self.config.workers)
            .map(|id| self.factory.create(id))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            resource = %request.resource,
            width = request.width,
            height = request.height,
            tiles = expected,
            workers = clients.len(),
            "Stitching {} image parts",
            expected
        );

        let mut counters = ProgressCounters::new(expected, self.config.progress_interval);
        if let Some(ref observer) = self.observer {
            counters = counters.with_observer(Arc::clone(observer));
        }
        let progress = Arc::new(counters);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = ReassemblySink::new(
            Canvas::new(request.width, request.height),
            expected,
            rx,
            Arc::clone(&progress),
        )
        .spawn();

        phase.advance(RunPhase::Fetching);
        let run_token = cancel.child_token();
        let ctx = WorkerContext {
            queue: Arc::new(WorkQueue::new(tiles)),
            locator: Arc::new(TileLocator::new(
                request.resource.clone(),
                self.config.format,
            )),
            results: tx,
            progress: Arc::clone(&progress),
            throttle: Arc::new(ThrottleGate::new(self.config.shared_backoff)),
            settings: WorkerSettings::from_config(&self.config),
            cancel: run_token.clone(),
        };

        let mut workers: WorkerSet = JoinSet::new();
        for (id, client) in clients.into_iter().enumerate() {
            workers.spawn(FetchWorker::new(id, client, ctx.clone()).run());
        }
        // The sink must see the channel close once every worker is gone
        drop(ctx);

        let mut summaries = Vec::new();
        let mut painted: Option<Canvas> = None;
        let mut sink_done = false;

        let failure = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(StitchError::Cancelled),
                joined = workers.join_next() => match joined {
                    None => break None,
                    Some(Ok(Ok(summary))) => {
                        debug!(
                            worker = summary.worker,
                            tiles = summary.tiles,
                            throttled = summary.throttled,
                            "Worker finished"
                        );
                        summaries.push(summary);
                    }
                    Some(Ok(Err(e))) => break Some(e),
                    Some(Err(e)) => break Some(StitchError::from(e)),
                },
                joined = &mut sink, if !sink_done => {
                    sink_done = true;
                    match flatten(joined) {
                        Ok(canvas) => painted = Some(canvas),
                        Err(e) => break Some(e),
                    }
                }
            }
        };

        if let Some(error) = failure {
            phase.advance(RunPhase::Aborted);
            run_token.cancel();
            self.shutdown(&mut workers).await;

            let error = if sink_done {
                error
            } else {
                prefer_sink_error(error, flatten(sink.await))
            };
            warn!(error = %error, "Stitching run aborted");
            return Err(error);
        }

        phase.advance(RunPhase::Draining);
        let canvas = match painted {
            Some(canvas) => canvas,
            None => flatten(sink.await)?,
        };

        phase.advance(RunPhase::Complete);
        let snapshot = progress.snapshot();
        let report = RunReport {
            tiles: snapshot.painted,
            throttled: snapshot.throttled,
            bytes: snapshot.bytes,
            elapsed: started.elapsed(),
            workers: summaries,
        };
        info!(
            tiles = report.tiles,
            throttled = report.throttled,
            bytes = report.bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Stitching complete"
        );

        Ok(StitchOutcome { canvas, report })
    }

    /// Waits up to the grace period for workers to exit, then aborts the rest.
    async fn shutdown(&self, workers: &mut WorkerSet) {
        let grace = self.config.shutdown_grace;
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = workers.join_next().await {
                if let Ok(Err(e)) = joined {
                    if !e.is_cancelled() {
                        debug!(error = %e, "Worker failed during shutdown");
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = workers.len(),
                grace_ms = grace.as_millis() as u64,
                "Workers still running after grace period, aborting"
            );
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }
    }
}

fn flatten(joined: Result<StitchResult<Canvas>, tokio::task::JoinError>) -> StitchResult<Canvas> {
    joined.map_err(StitchError::from).and_then(|result| result)
}

/// A sink failure is the root cause when workers only failed to deliver.
fn prefer_sink_error(error: StitchError, sink: StitchResult<Canvas>) -> StitchError {
    match (error, sink) {
        (StitchError::Cancelled, _) => StitchError::Cancelled,
        (_, Err(sink_error @ StitchError::Decode { .. })) => sink_error,
        (error, _) => error,
    }
}
