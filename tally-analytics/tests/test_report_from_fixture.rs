use std::path::PathBuf;

use tally_analytics::{ChartRenderer, Report, SvgChartRenderer};
use tally_core::{validate_batch, RawRecord, Verbosity, OTHER_BUCKET, UNCATEGORIZED};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("expenses.json")
}

fn load_fixture() -> Vec<RawRecord> {
    let text = std::fs::read_to_string(fixture_path()).expect("fixture should exist");
    serde_json::from_str(&text).expect("fixture should decode")
}

/// Every row is either an expense or a skip reason.
#[test]
fn test_fixture_validation_accounts_for_every_row() {
    let records = load_fixture();
    let batch = validate_batch(&records, Verbosity::Terse);

    assert_eq!(records.len(), 13);
    assert_eq!(batch.expenses.len() + batch.skipped.len(), records.len());
    assert_eq!(batch.skipped.len(), 3);
    assert!(batch.expenses.iter().any(|e| e.category == UNCATEGORIZED));
    assert!(batch.expenses.iter().any(|e| e.amount < 0.0));
}

/// Category, monthly and overall sums agree.
#[test]
fn test_fixture_totals_agree() {
    let report = Report::build(&load_fixture(), Verbosity::Terse).unwrap();
    let agg = &report.aggregates;

    let total = agg.total();
    let monthly: f64 = agg.monthly_totals.values().sum();
    assert!((agg.category_totals.sum() - total).abs() < 1e-6);
    assert!((monthly - total).abs() < 1e-6);

    let months: Vec<&String> = agg.monthly_totals.keys().collect();
    assert_eq!(months, vec!["2025-09", "2025-10", "2025-11"]);
    assert!((agg.monthly_totals["2025-10"] - (499.0 + 250.0 + 50.0 - 120.0)).abs() < 1e-6);
}

/// Statistics match a hand count over the valid rows.
#[test]
fn test_fixture_summary() {
    let summary = Report::build(&load_fixture(), Verbosity::Verbose)
        .unwrap()
        .summary();

    assert_eq!(summary.count, 10);
    assert_eq!(summary.max, 1999.0);
    assert_eq!(summary.min, -120.0);
    // Utilities 1999 vs Food 420 + 250 + 310.25
    assert_eq!(summary.top_category, "Utilities");
}

/// Bounded category views fold the tail into "Other".
#[test]
fn test_fixture_top_k_views() {
    let report = Report::build(&load_fixture(), Verbosity::Terse).unwrap();
    let all = report.aggregates.category_totals.sum();

    for k in [3, 5] {
        let slices = report.category_slices(k);
        assert_eq!(slices.len(), k + 1);
        assert_eq!(slices[k].0, OTHER_BUCKET);
        let kept: f64 = slices[..k].iter().map(|(_, v)| v).sum();
        assert!((slices[k].1 - (all - kept)).abs() < 1e-6);
        for w in slices[..k].windows(2) {
            assert!(w[0].1 >= w[1].1, "top-k slices not descending");
        }
    }
}

/// The three charts render from real aggregates.
#[test]
fn test_fixture_charts_render() {
    let report = Report::build(&load_fixture(), Verbosity::Terse).unwrap();
    let renderer = SvgChartRenderer::default();

    // the refund is folded into "Other", which stays positive at k = 3
    let slices = report.category_slices(3);
    assert!(slices.iter().all(|(_, v)| *v >= 0.0));
    let pie = renderer.category_chart(&slices).unwrap();
    assert!(!pie.bytes.is_empty());

    let line = renderer
        .monthly_chart(&report.aggregates.monthly_series())
        .unwrap();
    assert!(String::from_utf8(line.bytes).unwrap().contains("2025-11"));

    let bars = renderer
        .daily_chart(&report.aggregates.daily_series())
        .unwrap();
    assert_eq!(bars.file_name, "daily_expenses.svg");
}
