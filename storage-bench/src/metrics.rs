use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::result::BenchResult;

/// Cumulative statistics for one run. Only the aggregator mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningAggregate {
    /// Sum of `total_cost` over every consumed result, success or failure.
    pub processing_time: Duration,
    pub success_count: u64,
    pub failure_count: u64,
    /// Extrema over successful results only.
    pub max_cost: Option<Duration>,
    pub min_cost: Option<Duration>,
    /// Distinct slots that have produced at least one success.
    pub active_slots: HashSet<usize>,
    pub outcome_tally: BTreeMap<String, u64>,
    /// Successful costs in insertion order (unsorted).
    pub cost_history: Vec<Duration>,
}

impl RunningAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result into the totals.
    pub fn record(&mut self, result: &BenchResult) {
        self.processing_time += result.total_cost;
        *self.outcome_tally.entry(result.outcome.clone()).or_insert(0) += 1;

        if !result.success {
            self.failure_count += 1;
            return;
        }

        self.success_count += 1;
        self.max_cost = Some(self.max_cost.map_or(result.total_cost, |m| m.max(result.total_cost)));
        self.min_cost = Some(self.min_cost.map_or(result.total_cost, |m| m.min(result.total_cost)));
        self.active_slots.insert(result.slot_id);
        self.cost_history.push(result.total_cost);
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Copy the scalar fields out; `cost_history` stays behind.
    pub fn snapshot(&self, elapsed: Duration) -> Snapshot {
        Snapshot {
            elapsed,
            active_slots: self.active_slots.len(),
            success_count: self.success_count,
            failure_count: self.failure_count,
            processing_time: self.processing_time,
            max_cost: self.max_cost,
            min_cost: self.min_cost,
            outcome_tally: self.outcome_tally.clone(),
        }
    }
}

/// Point-in-time copy of a [`RunningAggregate`] plus wall time since run start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub elapsed: Duration,
    pub active_slots: usize,
    pub success_count: u64,
    pub failure_count: u64,
    pub processing_time: Duration,
    pub max_cost: Option<Duration>,
    pub min_cost: Option<Duration>,
    pub outcome_tally: BTreeMap<String, u64>,
}

impl Snapshot {
    /// Nothing to derive until at least one success has been timed.
    pub fn is_reportable(&self) -> bool {
        self.success_count > 0 && !self.processing_time.is_zero()
    }

    /// Amortized ("saturation-adjusted") QPS: `successes * concurrency /
    /// processing_time`, in operations per second. This scales per-operation
    /// cost by the configured concurrency and is not `successes / elapsed`.
    pub fn qps(&self, concurrency: usize) -> Option<f64> {
        if !self.is_reportable() {
            return None;
        }
        let scaled = self.success_count as f64 * concurrency as f64;
        Some(scaled / self.processing_time.as_secs_f64())
    }

    /// `processing_time / success_count`, exact to the nanosecond.
    pub fn avg_cost(&self) -> Option<Duration> {
        if !self.is_reportable() {
            return None;
        }
        let nanos = self.processing_time.as_nanos() / u128::from(self.success_count);
        Some(Duration::from_nanos(nanos as u64))
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Fraction of results that failed; 0 when nothing was recorded.
    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.failure_count as f64 / self.total() as f64
    }
}
