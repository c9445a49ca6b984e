use std::path::Path;
use std::time::Duration;
use storage_bench_common::{BenchError, Result, Target};

/// Interval between live report rows.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Slots launched per slow-start step.
pub const DEFAULT_SLOW_START_BATCH: usize = 10;

/// Staggered launch of worker loops: after launching every `batch`-th slot
/// (slot ids 0, batch, 2*batch, ...) the orchestrator waits `pause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowStart {
    pub batch: usize,
    pub pause: Duration,
}

impl SlowStart {
    /// Launch every slot immediately.
    pub fn none() -> Self {
        Self { batch: 0, pause: Duration::ZERO }
    }

    /// Spread launches over roughly a tenth of the run: one pause of
    /// `duration / 10 / concurrency` per batch of ten slots. The divisor
    /// saturates at `u32::MAX` for very large concurrency values.
    pub fn proportional(duration: Duration, concurrency: usize) -> Self {
        let divisor = u32::try_from(concurrency.max(1))
            .unwrap_or(u32::MAX)
            .saturating_mul(10);
        Self {
            batch: DEFAULT_SLOW_START_BATCH,
            pause: duration / divisor,
        }
    }

    /// The pause to take right after launching `slot_id`, if any.
    pub fn pause_after(&self, slot_id: usize) -> Option<Duration> {
        if self.batch == 0 || self.pause.is_zero() || slot_id % self.batch != 0 {
            return None;
        }
        Some(self.pause)
    }
}

/// Unit used when rendering costs on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostUnit {
    Millis,
    Seconds,
}

impl CostUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            CostUnit::Millis => "ms",
            CostUnit::Seconds => "s",
        }
    }

    /// Two-decimal value without suffix, as used in the live table.
    pub fn render(&self, cost: Duration) -> String {
        match self {
            CostUnit::Millis => format!("{:.2}", cost.as_secs_f64() * 1000.0),
            CostUnit::Seconds => format!("{:.2}", cost.as_secs_f64()),
        }
    }

    /// Value with suffix, as used in the percentile lines.
    pub fn render_percentile(&self, cost: Duration) -> String {
        match self {
            CostUnit::Millis => format!("{:.3}ms", cost.as_secs_f64() * 1000.0),
            CostUnit::Seconds => format!("{:.2}s", cost.as_secs_f64()),
        }
    }
}

/// Everything a run needs, handed to the harness at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Number of worker loops; also the result stream capacity and the
    /// multiplier in the amortized QPS figure.
    pub concurrency: usize,
    /// Run deadline measured from launch of the first slot.
    pub duration: Duration,
    pub tick: Duration,
    pub slow_start: SlowStart,
    pub cost_unit: CostUnit,
}

impl BenchConfig {
    pub fn new(concurrency: usize, duration: Duration) -> Self {
        Self {
            concurrency,
            duration,
            tick: DEFAULT_TICK,
            slow_start: SlowStart::proportional(duration, concurrency),
            cost_unit: CostUnit::Millis,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BenchError::Config("concurrency must be at least 1".into()));
        }
        if self.duration.is_zero() {
            return Err(BenchError::Config("duration must be greater than zero".into()));
        }
        if self.tick.is_zero() {
            return Err(BenchError::Config("tick interval must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Read a [`Target`] from a JSON file.
pub fn load_target(path: &Path) -> Result<Target> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BenchError::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| BenchError::Config(format!("invalid target {}: {e}", path.display())))
}
