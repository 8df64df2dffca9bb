//! A report is one validate-then-aggregate pass over a batch of store rows.

use tally_core::{
    aggregate, validate_batch, Aggregates, Expense, RawRecord, ReportError, Summary, Verbosity,
};
use tracing::info;

/// Validated expenses of one batch together with their aggregates.
#[derive(Debug, Clone)]
pub struct Report {
    pub expenses: Vec<Expense>,
    pub aggregates: Aggregates,
    /// Rows that failed validation
    pub skipped: usize,
}

impl Report {
    /// Validate `records` and aggregate the survivors.
    ///
    /// Fails with [`ReportError::NoValidData`] only when no row validates.
    pub fn build(records: &[RawRecord], verbosity: Verbosity) -> Result<Self, ReportError> {
        let batch = validate_batch(records, verbosity);
        let aggregates = aggregate(&batch.expenses)?;
        info!(
            valid = batch.expenses.len(),
            skipped = batch.skipped.len(),
            "processed expense records"
        );
        Ok(Self {
            skipped: batch.skipped.len(),
            expenses: batch.expenses,
            aggregates,
        })
    }

    pub fn summary(&self) -> Summary {
        self.aggregates.summary()
    }

    /// The first `limit` expenses (store order, newest first) and their sum.
    pub fn recent(&self, limit: usize) -> (&[Expense], f64) {
        let shown = &self.expenses[..limit.min(self.expenses.len())];
        (shown, shown.iter().map(|e| e.amount).sum())
    }

    /// Category slices for a bounded chart: top `k` plus "Other".
    pub fn category_slices(&self, k: usize) -> Vec<(String, f64)> {
        self.aggregates.category_totals.top_k_with_other(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(v: serde_json::Value) -> Vec<RawRecord> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_two_record_batch() {
        let records = rows(json!([
            {"time": "2025-10-01T10:00", "category": "Food", "amount": "250"},
            {"time": "2025-10-02", "category": " ", "amount": "50"}
        ]));
        let report = Report::build(&records, Verbosity::Terse).unwrap();

        let cats: Vec<&str> = report.expenses.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(cats, vec!["Food", "Uncategorized"]);
        assert_eq!(report.aggregates.monthly_totals.get("2025-10"), Some(&300.0));
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_lone_record_without_amount_is_no_valid_data() {
        let records = rows(json!([{"time": "2025-10-01", "category": "Food"}]));
        let err = Report::build(&records, Verbosity::Verbose).unwrap_err();
        assert_eq!(err, ReportError::NoValidData);
    }

    #[test]
    fn test_recent_caps_and_sums() {
        let records = rows(json!([
            {"time": "2025-10-03", "category": "A", "amount": 1},
            {"time": "2025-10-02", "category": "B", "amount": 2},
            {"time": "2025-10-01", "category": "C", "amount": 4}
        ]));
        let report = Report::build(&records, Verbosity::Terse).unwrap();

        let (shown, total) = report.recent(2);
        assert_eq!(shown.len(), 2);
        assert_eq!(total, 3.0);

        let (shown, total) = report.recent(10);
        assert_eq!(shown.len(), 3);
        assert_eq!(total, 7.0);
    }
}
