use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use storage_bench_common::BenchError;

/// Cost of one named sub-phase of an operation (e.g. `send`, `body`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCost {
    pub name: &'static str,
    pub cost: Duration,
}

impl PhaseCost {
    pub fn new(name: &'static str, cost: Duration) -> Self {
        Self { name, cost }
    }
}

/// How a single operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `label` is what the outcome tally counts, usually a status code.
    Success { label: String },
    Failure { label: String, error: BenchError },
}

impl Outcome {
    pub fn success(label: impl Into<String>) -> Self {
        Outcome::Success { label: label.into() }
    }

    /// Failure labelled from the error kind (status code for HTTP errors).
    pub fn failure(error: BenchError) -> Self {
        Outcome::Failure { label: error.outcome_label(), error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Outcome::Success { label } | Outcome::Failure { label, .. } => label,
        }
    }
}

/// What a timed operation hands back to its worker loop. The loop owns the
/// clock for the total cost; the operation only reports its sub-phases.
#[derive(Debug, Clone, PartialEq)]
pub struct OpOutput {
    pub phases: Vec<PhaseCost>,
    pub outcome: Outcome,
}

impl OpOutput {
    pub fn new(phases: Vec<PhaseCost>, outcome: Outcome) -> Self {
        Self { phases, outcome }
    }
}

/// One timed, outcome-tagged observation of a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchResult {
    /// Which worker loop produced this result.
    pub slot_id: usize,
    /// Strictly increasing within a slot, starting at 0.
    pub sequence_id: u64,
    /// Wall-clock time the operation began.
    pub start_time: SystemTime,
    pub total_cost: Duration,
    /// Diagnostic only; never part of the aggregate math.
    pub phases: Vec<PhaseCost>,
    pub success: bool,
    pub outcome: String,
    pub error: Option<String>,
}

impl BenchResult {
    pub fn from_output(
        slot_id: usize,
        sequence_id: u64,
        start_time: SystemTime,
        total_cost: Duration,
        output: OpOutput,
    ) -> Self {
        let (success, outcome, error) = match output.outcome {
            Outcome::Success { label } => (true, label, None),
            Outcome::Failure { label, error } => (false, label, Some(error.to_string())),
        };
        Self {
            slot_id,
            sequence_id,
            start_time,
            total_cost,
            phases: output.phases,
            success,
            outcome,
            error,
        }
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let since_epoch = self.start_time.duration_since(UNIX_EPOCH).unwrap_or_default();
        let secs_in_hour = since_epoch.as_secs() % 3600;
        write!(
            f,
            "slot:{} seq:{} start:{:02}:{:02}.{:03} success:{} cost:",
            self.slot_id,
            self.sequence_id,
            secs_in_hour / 60,
            secs_in_hour % 60,
            since_epoch.subsec_millis(),
            self.success,
        )?;
        for (i, phase) in self.phases.iter().enumerate() {
            if i > 0 {
                write!(f, " &")?;
            }
            write!(f, " {}={:.3}s", phase.name, phase.cost.as_secs_f64())?;
        }
        write!(f, " => {:.3}s", self.total_cost.as_secs_f64())
    }
}
