use std::time::{Duration, SystemTime};
use storage_bench::metrics::RunningAggregate;
use storage_bench::result::BenchResult;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn result(slot_id: usize, sequence_id: u64, cost: Duration, success: bool) -> BenchResult {
    BenchResult {
        slot_id,
        sequence_id,
        start_time: SystemTime::now(),
        total_cost: cost,
        phases: vec![],
        success,
        outcome: if success { "200".to_string() } else { "503".to_string() },
        error: if success { None } else { Some("HTTP 503: busy".to_string()) },
    }
}

fn fold(results: &[BenchResult]) -> RunningAggregate {
    let mut agg = RunningAggregate::new();
    for r in results {
        agg.record(r);
    }
    agg
}

fn mixed() -> Vec<BenchResult> {
    vec![
        result(0, 0, ms(120), true),
        result(1, 0, ms(80), false),
        result(0, 1, ms(40), true),
        result(2, 0, ms(300), true),
        result(1, 1, ms(5), false),
        result(2, 1, ms(75), true),
    ]
}

#[test]
fn test_counts_equal_results_consumed() {
    let agg = fold(&mixed());
    assert_eq!(agg.success_count, 4);
    assert_eq!(agg.failure_count, 2);
    assert_eq!(agg.total(), 6);
}

#[test]
fn test_processing_time_includes_failures() {
    let agg = fold(&mixed());
    assert_eq!(agg.processing_time, ms(120 + 80 + 40 + 300 + 5 + 75));
}

#[test]
fn test_aggregate_is_order_independent() {
    let forward = fold(&mixed());
    let mut reversed_input = mixed();
    reversed_input.reverse();
    let reversed = fold(&reversed_input);

    assert_eq!(forward.success_count, reversed.success_count);
    assert_eq!(forward.failure_count, reversed.failure_count);
    assert_eq!(forward.processing_time, reversed.processing_time);
    assert_eq!(forward.max_cost, reversed.max_cost);
    assert_eq!(forward.min_cost, reversed.min_cost);
    assert_eq!(forward.active_slots, reversed.active_slots);
    assert_eq!(forward.outcome_tally, reversed.outcome_tally);
}

#[test]
fn test_extrema_ignore_failures() {
    let mut agg = fold(&[result(0, 0, ms(100), true), result(0, 1, ms(200), true)]);
    agg.record(&result(1, 0, ms(10_000), false));
    agg.record(&result(1, 1, Duration::ZERO, false));

    assert_eq!(agg.max_cost, Some(ms(200)));
    assert_eq!(agg.min_cost, Some(ms(100)));
}

#[test]
fn test_extrema_empty_until_first_success() {
    let agg = fold(&[result(0, 0, ms(50), false)]);
    assert_eq!(agg.max_cost, None);
    assert_eq!(agg.min_cost, None);
    assert!(agg.cost_history.is_empty());
}

#[test]
fn test_cost_history_keeps_successes_in_insertion_order() {
    let agg = fold(&mixed());
    assert_eq!(agg.cost_history, vec![ms(120), ms(40), ms(300), ms(75)]);
}

#[test]
fn test_active_slots_counts_slots_with_a_success() {
    let agg = fold(&mixed());
    // slot 1 only ever failed
    assert_eq!(agg.active_slots.len(), 2);
    assert!(agg.active_slots.contains(&0));
    assert!(agg.active_slots.contains(&2));
}

#[test]
fn test_outcome_tally() {
    let agg = fold(&mixed());
    assert_eq!(agg.outcome_tally.get("200"), Some(&4));
    assert_eq!(agg.outcome_tally.get("503"), Some(&2));
}

#[test]
fn test_snapshot_copies_scalars() {
    let agg = fold(&mixed());
    let snap = agg.snapshot(ms(1500));
    assert_eq!(snap.elapsed, ms(1500));
    assert_eq!(snap.active_slots, 2);
    assert_eq!(snap.success_count, 4);
    assert_eq!(snap.failure_count, 2);
    assert_eq!(snap.processing_time, agg.processing_time);
    assert_eq!(snap.max_cost, Some(ms(300)));
    assert_eq!(snap.min_cost, Some(ms(40)));
    assert_eq!(snap.outcome_tally, agg.outcome_tally);
}

#[test]
fn test_avg_and_qps_exact_arithmetic() {
    // concurrency=3, 10 successes of exactly 100ms:
    // avg = 1000ms / 10 = 100ms; qps = 10 * 3 / 1.0s = 30
    let results: Vec<_> = (0..10).map(|i| result(i % 3, i as u64, ms(100), true)).collect();
    let snap = fold(&results).snapshot(ms(400));

    assert_eq!(snap.avg_cost(), Some(ms(100)));
    assert_eq!(snap.qps(3), Some(30.0));
}

#[test]
fn test_qps_uses_processing_time_not_elapsed() {
    let results: Vec<_> = (0..4).map(|i| result(0, i, ms(250), true)).collect();
    // Elapsed wall time is irrelevant to the amortized figure.
    let a = fold(&results).snapshot(ms(1));
    let b = fold(&results).snapshot(Duration::from_secs(60));
    assert_eq!(a.qps(2), Some(8.0));
    assert_eq!(b.qps(2), Some(8.0));
}

#[test]
fn test_derived_metrics_skip_without_success() {
    let snap = fold(&[result(0, 0, ms(100), false)]).snapshot(ms(1000));
    assert!(!snap.is_reportable());
    assert_eq!(snap.qps(4), None);
    assert_eq!(snap.avg_cost(), None);
}

#[test]
fn test_derived_metrics_skip_with_zero_processing_time() {
    let snap = fold(&[result(0, 0, Duration::ZERO, true)]).snapshot(ms(1000));
    assert!(!snap.is_reportable());
    assert_eq!(snap.qps(1), None);
}

#[test]
fn test_error_rate() {
    let snap = fold(&mixed()).snapshot(ms(0));
    assert_eq!(snap.error_rate(), 2.0 / 6.0);
    assert_eq!(RunningAggregate::new().snapshot(ms(0)).error_rate(), 0.0);
}
