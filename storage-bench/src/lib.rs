//! Concurrent load generation against an object-storage endpoint with live
//! and final latency/throughput statistics.
//!
//! Worker loops ([`worker::run_slot`]) feed a bounded result stream that a
//! single [`aggregator::Aggregator`] folds into a [`metrics::RunningAggregate`].
//! A ticking printer reads snapshots of it concurrently, and once the stream
//! is drained [`run::Harness`] prints the final block with tail percentiles.

pub mod aggregator;
pub mod config;
pub mod metrics;
pub mod operation;
pub mod percentile;
pub mod report;
pub mod result;
pub mod run;
pub mod worker;

pub use config::{BenchConfig, CostUnit, SlowStart};
pub use run::{Harness, RunPhase, RunSummary};
