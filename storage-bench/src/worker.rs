use std::time::SystemTime;
use storage_bench_common::{BenchError, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::operation::{OpContext, TimedOperation};
use crate::result::BenchResult;

/// Drive `op` for slot `slot_id` until `cancel` fires, sending one result per
/// invocation on `tx`.
///
/// Cancellation is only checked between operations: an invocation that is
/// already running completes and its result is still sent. Failed operations
/// are not retried. Returns the number of operations issued, or
/// [`BenchError::StreamClosed`] if the receiving side went away.
pub async fn run_slot<O: TimedOperation>(
    slot_id: usize,
    mut op: O,
    cancel: CancellationToken,
    tx: mpsc::Sender<BenchResult>,
) -> Result<u64> {
    let mut sequence_id: u64 = 0;

    while !cancel.is_cancelled() {
        let ctx = OpContext { slot_id, sequence_id, cancel: cancel.clone() };

        let start_time = SystemTime::now();
        let started = Instant::now();
        let output = op.execute(&ctx).await;
        let total_cost = started.elapsed();

        let result = BenchResult::from_output(slot_id, sequence_id, start_time, total_cost, output);
        if let Some(error) = &result.error {
            warn!(slot = slot_id, seq = sequence_id, %error, "operation failed");
        }
        debug!(%result, "operation finished");

        tx.send(result).await.map_err(|_| BenchError::StreamClosed)?;
        sequence_id += 1;
    }

    Ok(sequence_id)
}
