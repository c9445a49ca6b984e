//! Console report: the live table and the final result block.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::CostUnit;
use crate::metrics::Snapshot;
use crate::percentile::TailLatencies;

const RULE_TOP: &str = "─────┬───────┬───────┬───────┬────────┬───────────┬───────────┬───────────┬────────";
const RULE_MID: &str = "─────┼───────┼───────┼───────┼────────┼───────────┼───────────┼───────────┼────────";
const BANNER_START: &str = "*************************  result  ****************************";
const BANNER_END: &str = "*************************  end     ****************************";

/// Where report lines go. Kept separate from `tracing` so the table stays
/// readable when logs are enabled.
pub trait ReportSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Writes report lines to stdout.
pub struct Console;

impl ReportSink for Console {
    fn line(&self, line: &str) {
        println!("{line}");
    }
}

/// Collects report lines in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

pub fn header_lines(unit: CostUnit) -> Vec<String> {
    let col = |name: &str| format!("{:>11}", format!("{name}/{}", unit.suffix()));
    vec![
        String::new(),
        RULE_TOP.to_string(),
        format!(
            " cost│concurr│success│ failed│   qps  │{}│{}│{}│ outcome",
            col("max cost"),
            col("min cost"),
            col("avg cost"),
        ),
        RULE_MID.to_string(),
    ]
}

/// One live table row, or `None` while there is no success to divide by.
pub fn format_row(snapshot: &Snapshot, concurrency: usize, unit: CostUnit) -> Option<String> {
    let qps = snapshot.qps(concurrency)?;
    let avg = snapshot.avg_cost()?;
    let cost = |d: Option<Duration>| unit.render(d.unwrap_or_default());
    Some(format!(
        "{:4.0}s│{:7}│{:7}│{:7}│{:8.2}│{:>11}│{:>11}│{:>11}│{}",
        snapshot.elapsed.as_secs_f64(),
        snapshot.active_slots,
        snapshot.success_count,
        snapshot.failure_count,
        qps,
        cost(snapshot.max_cost),
        cost(snapshot.min_cost),
        unit.render(avg),
        format_tally(&snapshot.outcome_tally),
    ))
}

/// `label:count` pairs joined by `;`, ordered by label.
pub fn format_tally(tally: &BTreeMap<String, u64>) -> String {
    tally
        .iter()
        .map(|(label, count)| format!("{label}:{count}"))
        .collect::<Vec<_>>()
        .join(";")
}

pub fn percentile_lines(tails: &TailLatencies, unit: CostUnit) -> Vec<String> {
    tails
        .labelled()
        .iter()
        .map(|(name, cost)| format!("{name}: {}", unit.render_percentile(*cost)))
        .collect()
}

/// The closing block. Percentile lines are omitted when there were no
/// successful results.
pub fn final_lines(
    concurrency: usize,
    snapshot: &Snapshot,
    tails: Option<&TailLatencies>,
    unit: CostUnit,
) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        BANNER_START.to_string(),
        format!("concurrency: {concurrency}"),
        format!(
            "total: {} elapsed: {:.3}s success: {} failure: {}",
            snapshot.total(),
            snapshot.elapsed.as_secs_f64(),
            snapshot.success_count,
            snapshot.failure_count,
        ),
    ];
    if let Some(tails) = tails {
        lines.extend(percentile_lines(tails, unit));
    }
    lines.push(BANNER_END.to_string());
    lines
}

pub fn emit(sink: &dyn ReportSink, lines: &[String]) {
    for line in lines {
        sink.line(line);
    }
}
