use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::CostUnit;
use crate::metrics::{RunningAggregate, Snapshot};
use crate::report::{self, ReportSink};
use crate::result::BenchResult;

/// Sole consumer of the result stream and sole writer of the aggregate.
pub struct Aggregator {
    state: Arc<RwLock<RunningAggregate>>,
    started: Instant,
}

impl Aggregator {
    /// Start the run clock now.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Self {
            state: Arc::new(RwLock::new(RunningAggregate::new())),
            started,
        }
    }

    /// Read-only handle for the live printer.
    pub fn handle(&self) -> SnapshotHandle {
        SnapshotHandle { state: Arc::clone(&self.state), started: self.started }
    }

    /// Fold every result into the aggregate until all senders are dropped.
    /// Each result is applied under the write lock, so a concurrent snapshot
    /// sees it either entirely or not at all. Returns the number consumed.
    pub async fn consume(&self, mut rx: mpsc::Receiver<BenchResult>) -> u64 {
        let mut consumed = 0;
        while let Some(result) = rx.recv().await {
            self.state.write().await.record(&result);
            consumed += 1;
        }
        consumed
    }

    /// Take the final aggregate. Cheap once every [`SnapshotHandle`] is gone;
    /// clones otherwise.
    pub async fn finish(self) -> RunningAggregate {
        match Arc::try_unwrap(self.state) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().await.clone(),
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct SnapshotHandle {
    state: Arc<RwLock<RunningAggregate>>,
    started: Instant,
}

impl SnapshotHandle {
    /// The read lock is held only while the scalar fields are copied.
    pub async fn snapshot(&self) -> Snapshot {
        let elapsed = self.started.elapsed();
        self.state.read().await.snapshot(elapsed)
    }
}

/// Print a table row every `tick` until `stop` is cancelled. Ticks with no
/// success yet are skipped, and ticks missed during a stall are not made up.
/// Resolves to the number of rows printed.
pub fn spawn_printer(
    handle: SnapshotHandle,
    tick: Duration,
    concurrency: usize,
    unit: CostUnit,
    sink: Arc<dyn ReportSink>,
    stop: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        // One row per tick after a stall, not a catch-up burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the immediate first tick
        let mut printed = 0;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    let snapshot = handle.snapshot().await;
                    if let Some(row) = report::format_row(&snapshot, concurrency, unit) {
                        sink.line(&row);
                        printed += 1;
                    }
                }
            }
        }
        printed
    })
}
