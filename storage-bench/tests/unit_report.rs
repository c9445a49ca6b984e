use std::collections::BTreeMap;
use std::time::Duration;
use storage_bench::metrics::Snapshot;
use storage_bench::percentile::TailLatencies;
use storage_bench::report::{
    emit, final_lines, format_row, format_tally, header_lines, percentile_lines, MemorySink, ReportSink,
};
use storage_bench::CostUnit;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn snapshot() -> Snapshot {
    let mut tally = BTreeMap::new();
    tally.insert("503".to_string(), 1);
    tally.insert("200".to_string(), 10);
    Snapshot {
        elapsed: ms(12_400),
        active_slots: 3,
        success_count: 10,
        failure_count: 1,
        processing_time: ms(1_100),
        max_cost: Some(ms(250)),
        min_cost: Some(ms(40)),
        outcome_tally: tally,
    }
}

#[test]
fn test_format_tally_sorted_by_label() {
    assert_eq!(format_tally(&snapshot().outcome_tally), "200:10;503:1");
    assert_eq!(format_tally(&BTreeMap::new()), "");
}

#[test]
fn test_row_in_millis() {
    // qps = 10 * 3 / 1.1s = 27.27; avg = 1100ms / 10 = 110ms
    let row = format_row(&snapshot(), 3, CostUnit::Millis).unwrap();
    assert_eq!(
        row,
        "  12s│      3│     10│      1│   27.27│     250.00│      40.00│     110.00│200:10;503:1"
    );
}

#[test]
fn test_row_in_seconds() {
    let row = format_row(&snapshot(), 3, CostUnit::Seconds).unwrap();
    assert_eq!(
        row,
        "  12s│      3│     10│      1│   27.27│       0.25│       0.04│       0.11│200:10;503:1"
    );
}

#[test]
fn test_row_skipped_without_success() {
    let snap = Snapshot { failure_count: 4, processing_time: ms(400), ..Snapshot::default() };
    assert_eq!(format_row(&snap, 2, CostUnit::Millis), None);
}

#[test]
fn test_header_follows_unit() {
    let ms_header = header_lines(CostUnit::Millis);
    assert!(ms_header[2].contains("max cost/ms│min cost/ms│avg cost/ms"));

    let s_header = header_lines(CostUnit::Seconds);
    assert!(s_header[2].contains(" max cost/s│ min cost/s│ avg cost/s"));
}

#[test]
fn test_header_columns_line_up_with_rows() {
    let header = &header_lines(CostUnit::Millis)[2];
    let row = format_row(&snapshot(), 3, CostUnit::Millis).unwrap();
    let header_bars: Vec<_> = header.char_indices().filter(|(_, c)| *c == '│').map(|(i, _)| i).collect();
    let row_bars: Vec<_> = row.char_indices().filter(|(_, c)| *c == '│').map(|(i, _)| i).collect();
    assert_eq!(header_bars, row_bars);
}

#[test]
fn test_percentile_lines() {
    let tails = TailLatencies { p90: ms(910), p95: ms(960), p99: ms(1000) };
    assert_eq!(
        percentile_lines(&tails, CostUnit::Millis),
        vec!["P90: 910.000ms", "P95: 960.000ms", "P99: 1000.000ms"]
    );
    assert_eq!(
        percentile_lines(&tails, CostUnit::Seconds),
        vec!["P90: 0.91s", "P95: 0.96s", "P99: 1.00s"]
    );
}

#[test]
fn test_final_lines_with_percentiles() {
    let tails = TailLatencies { p90: ms(200), p95: ms(240), p99: ms(250) };
    let lines = final_lines(3, &snapshot(), Some(&tails), CostUnit::Millis);

    assert!(lines.contains(&"concurrency: 3".to_string()));
    assert!(lines.contains(&"total: 11 elapsed: 12.400s success: 10 failure: 1".to_string()));
    assert!(lines.contains(&"P90: 200.000ms".to_string()));
    assert!(lines.contains(&"P99: 250.000ms".to_string()));
}

#[test]
fn test_final_lines_without_percentiles() {
    let snap = Snapshot { failure_count: 2, ..Snapshot::default() };
    let lines = final_lines(1, &snap, None, CostUnit::Millis);
    assert!(lines.iter().all(|l| !l.starts_with('P')));
    assert!(lines.contains(&"total: 2 elapsed: 0.000s success: 0 failure: 2".to_string()));
}

#[test]
fn test_memory_sink_collects_in_order() {
    let sink = MemorySink::new();
    sink.line("a");
    emit(&sink, &["b".to_string(), "c".to_string()]);
    assert_eq!(sink.lines(), vec!["a", "b", "c"]);
}
