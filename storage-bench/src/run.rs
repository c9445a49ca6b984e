use std::sync::Arc;
use std::time::Duration;
use storage_bench_common::{BenchError, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregator::{spawn_printer, Aggregator};
use crate::config::BenchConfig;
use crate::metrics::Snapshot;
use crate::operation::TimedOperation;
use crate::percentile::TailLatencies;
use crate::report::{self, ReportSink};
use crate::worker::run_slot;

/// Whole-run lifecycle. Phases only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    NotStarted,
    /// Worker loops, aggregator and live printer are active.
    Running,
    /// Every worker has exited and the stream is closed; the aggregator is
    /// consuming the backlog.
    Draining,
    /// Final snapshot and percentiles are being computed and printed.
    Finalizing,
    Done,
}

/// What a finished run reports back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub concurrency: usize,
    /// Final snapshot; `elapsed` is the full run wall time.
    pub snapshot: Snapshot,
    pub tails: Option<TailLatencies>,
    pub slots_started: usize,
    /// Sum of per-slot operation counts as reported by the worker loops.
    pub operations_issued: u64,
    pub results_consumed: u64,
    pub live_rows: u64,
}

impl RunSummary {
    pub fn error_rate(&self) -> f64 {
        self.snapshot.error_rate()
    }
}

pub struct Harness {
    config: BenchConfig,
    sink: Arc<dyn ReportSink>,
    phase: watch::Sender<RunPhase>,
}

impl Harness {
    pub fn new(config: BenchConfig, sink: Arc<dyn ReportSink>) -> Result<Self> {
        config.validate()?;
        let (phase, _) = watch::channel(RunPhase::NotStarted);
        Ok(Self { config, sink, phase })
    }

    /// Subscribe to phase transitions.
    pub fn phase(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: RunPhase) {
        info!(?phase, "run phase");
        self.phase.send_replace(phase);
    }

    /// Run the benchmark once. `make_op` builds the operation for each slot.
    /// `cancel` stops the run early the same way the deadline does: no new
    /// operations start, in-flight ones finish and are counted.
    ///
    /// Operation failures never fail the run. An error is returned only when
    /// a worker found the result stream closed, after the run has still been
    /// drained and reported.
    pub async fn run<O, F>(&self, cancel: CancellationToken, mut make_op: F) -> Result<RunSummary>
    where
        O: TimedOperation,
        F: FnMut(usize) -> O,
    {
        if *self.phase.borrow() != RunPhase::NotStarted {
            return Err(BenchError::Config("a harness runs only once".into()));
        }

        let concurrency = self.config.concurrency;
        let unit = self.config.cost_unit;
        info!(concurrency, duration_secs = self.config.duration.as_secs_f64(), "starting run");

        let (tx, rx) = mpsc::channel(concurrency);
        let started = Instant::now();
        let aggregator = Aggregator::started_at(started);

        report::emit(self.sink.as_ref(), &report::header_lines(unit));
        let stop_printer = CancellationToken::new();
        let printer = spawn_printer(
            aggregator.handle(),
            self.config.tick,
            concurrency,
            unit,
            Arc::clone(&self.sink),
            stop_printer.clone(),
        );
        let consumer = tokio::spawn(async move {
            let consumed = aggregator.consume(rx).await;
            (aggregator, consumed)
        });

        let deadline = cancel.child_token();
        let timer = spawn_deadline(deadline.clone(), self.config.duration);

        self.enter(RunPhase::Running);
        let mut workers = JoinSet::new();
        for slot_id in 0..concurrency {
            if deadline.is_cancelled() {
                break;
            }
            workers.spawn(run_slot(slot_id, make_op(slot_id), deadline.clone(), tx.clone()));
            info!(slot = slot_id, "worker started");
            if let Some(pause) = self.config.slow_start.pause_after(slot_id) {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = deadline.cancelled() => {}
                }
            }
        }
        let slots_started = workers.len();

        let mut operations_issued = 0;
        let mut stream_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(issued)) => operations_issued += issued,
                Ok(Err(e)) => {
                    error!(error = %e, "worker stopped early");
                    stream_error = Some(e);
                }
                Err(e) => error!(error = %e, "worker task failed"),
            }
        }

        self.enter(RunPhase::Draining);
        // Every worker has dropped its sender; this closes the stream.
        drop(tx);
        let (aggregator, results_consumed) = match consumer.await {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "aggregator task failed");
                return Err(BenchError::StreamClosed);
            }
        };
        stop_printer.cancel();
        let live_rows = printer.await.unwrap_or_default();
        deadline.cancel();
        timer.await.ok();

        self.enter(RunPhase::Finalizing);
        let elapsed = started.elapsed();
        let aggregate = aggregator.finish().await;
        let snapshot = aggregate.snapshot(elapsed);
        let tails = TailLatencies::from_history(&aggregate.cost_history);

        if let Some(row) = report::format_row(&snapshot, concurrency, unit) {
            self.sink.line(&row);
        }
        report::emit(
            self.sink.as_ref(),
            &report::final_lines(concurrency, &snapshot, tails.as_ref(), unit),
        );

        self.enter(RunPhase::Done);
        info!(
            results = results_consumed,
            success = snapshot.success_count,
            failure = snapshot.failure_count,
            "run finished"
        );

        if let Some(e) = stream_error {
            return Err(e);
        }
        Ok(RunSummary {
            concurrency,
            snapshot,
            tails,
            slots_started,
            operations_issued,
            results_consumed,
            live_rows,
        })
    }
}

/// Cancel `deadline` once `duration` has passed, unless it is cancelled first.
fn spawn_deadline(deadline: CancellationToken, duration: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                info!("run deadline reached");
                deadline.cancel();
            }
            _ = deadline.cancelled() => {}
        }
    })
}
