use std::time::Duration;

/// Tail latencies reported once the result stream is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailLatencies {
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl TailLatencies {
    /// Sort a copy of `history` and read P90/P95/P99 from it.
    /// Returns `None` for an empty history.
    pub fn from_history(history: &[Duration]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }
        let mut sorted = history.to_vec();
        sorted.sort_unstable();
        Some(Self {
            p90: at(&sorted, 90),
            p95: at(&sorted, 95),
            p99: at(&sorted, 99),
        })
    }

    pub fn labelled(&self) -> [(&'static str, Duration); 3] {
        [("P90", self.p90), ("P95", self.p95), ("P99", self.p99)]
    }
}

/// Cost at index `floor(n * percent / 100)` of an unsorted history, or
/// `None` if it is empty.
pub fn percentile(history: &[Duration], percent: usize) -> Option<Duration> {
    if history.is_empty() {
        return None;
    }
    let mut sorted = history.to_vec();
    sorted.sort_unstable();
    Some(at(&sorted, percent))
}

// Integer arithmetic keeps the truncation exact; the clamp only matters for
// percent == 100.
fn at(sorted: &[Duration], percent: usize) -> Duration {
    let idx = sorted.len() * percent / 100;
    sorted[idx.min(sorted.len() - 1)]
}
