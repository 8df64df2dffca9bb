//! Record validation: turn untrusted store rows into typed expenses.
//!
//! Each row is checked on its own. A bad row is logged and skipped; it never
//! aborts the rest of the batch.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::error::ValidationError;
use crate::expense::{Expense, RawRecord, UNCATEGORIZED};

/// How much detail to log about rejected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only the error kind label
    #[default]
    Terse,
    /// The offending record and the full error
    Verbose,
}

impl Verbosity {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            Verbosity::Verbose
        } else {
            Verbosity::Terse
        }
    }

    pub fn is_verbose(self) -> bool {
        self == Verbosity::Verbose
    }
}

/// A record that failed validation, with its position in the input batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of validating a whole batch.
///
/// `expenses.len() + skipped.len()` always equals the input length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub expenses: Vec<Expense>,
    pub skipped: Vec<Skipped>,
}

impl ValidatedBatch {
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

/// Validate one raw record.
///
/// `amount`, `time` and `category` must be present. A negative amount is
/// accepted and logged as a warning.
pub fn validate_record(raw: &RawRecord) -> Result<Expense, ValidationError> {
    let amount_raw = raw
        .amount
        .as_ref()
        .ok_or(ValidationError::MissingField("amount"))?;
    let time_raw = raw
        .time
        .as_ref()
        .ok_or(ValidationError::MissingField("time"))?;
    let category_raw = raw
        .category
        .as_ref()
        .ok_or(ValidationError::MissingField("category"))?;

    let amount = parse_amount(amount_raw)?;
    if amount < 0.0 {
        warn!(amount, "negative amount found");
    }

    let date = parse_date(time_raw)?;

    let category = match value_text(category_raw).trim() {
        "" => UNCATEGORIZED.to_string(),
        trimmed => trimmed.to_string(),
    };

    let note = raw.note.as_ref().map(value_text).unwrap_or_default();

    Ok(Expense {
        date,
        amount,
        category,
        note,
    })
}

/// Validate every record, keeping the valid ones in input order.
pub fn validate_batch(records: &[RawRecord], verbosity: Verbosity) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();

    for (index, raw) in records.iter().enumerate() {
        match validate_record(raw) {
            Ok(expense) => batch.expenses.push(expense),
            Err(error) => {
                if verbosity.is_verbose() {
                    warn!(index, record = ?raw, error = %error, "skipping invalid record");
                } else {
                    warn!(index, kind = error.kind(), "skipping invalid record");
                }
                batch.skipped.push(Skipped { index, error });
            }
        }
    }

    batch
}

fn parse_amount(value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|a| a.is_finite())
        .ok_or_else(|| ValidationError::MalformedAmount(value.to_string()))
}

/// Parse the date part of an ISO-8601 timestamp, ignoring time-of-day.
fn parse_date(value: &Value) -> Result<NaiveDate, ValidationError> {
    let malformed = || ValidationError::MalformedTimestamp(value.to_string());
    let text = value.as_str().ok_or_else(malformed)?.trim();
    let date_part = text
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| malformed())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_valid_record_keeps_date_only() {
        let e = validate_record(&raw(json!({
            "time": "2025-10-01T10:00:00.123456",
            "category": " Food ",
            "amount": "250",
            "note": "Lunch"
        })))
        .unwrap();
        assert_eq!(e.date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(e.amount, 250.0);
        assert_eq!(e.category, "Food");
        assert_eq!(e.note, "Lunch");
    }

    #[test]
    fn test_blank_category_becomes_uncategorized() {
        let e = validate_record(&raw(json!({
            "time": "2025-10-02",
            "category": "   ",
            "amount": 50
        })))
        .unwrap();
        assert_eq!(e.category, UNCATEGORIZED);
        assert_eq!(e.note, "");
    }

    #[test]
    fn test_missing_fields() {
        let err = validate_record(&raw(json!({"time": "2025-10-02", "category": "Food"})))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("amount"));

        let err = validate_record(&raw(json!({"amount": 1, "category": "Food"}))).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("time"));

        let err = validate_record(&raw(json!({"amount": 1, "time": "2025-10-02"}))).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("category"));
    }

    #[test]
    fn test_malformed_amount_and_time() {
        let err = validate_record(&raw(json!({
            "time": "2025-10-02", "category": "Food", "amount": "twelve"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "MalformedAmount");

        let err = validate_record(&raw(json!({
            "time": "2025-10-02", "category": "Food", "amount": "NaN"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "MalformedAmount");

        let err = validate_record(&raw(json!({
            "time": "10/02/2025", "category": "Food", "amount": 3
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "MalformedTimestamp");

        let err = validate_record(&raw(json!({
            "time": 20251002, "category": "Food", "amount": 3
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "MalformedTimestamp");
    }

    #[test]
    fn test_negative_amount_is_kept() {
        let e = validate_record(&raw(json!({
            "time": "2025-10-02", "category": "Refund", "amount": -40.5
        })))
        .unwrap();
        assert_eq!(e.amount, -40.5);
    }

    #[test]
    fn test_batch_counts_add_up() {
        let records = vec![
            raw(json!({"time": "2025-10-01T10:00", "category": "Food", "amount": "250"})),
            raw(json!({"time": "2025-10-02", "category": "Food"})),
            raw(json!({"time": "bad", "category": "Food", "amount": 1})),
            raw(json!({"time": "2025-10-03", "category": "Bus", "amount": 20})),
        ];
        for verbosity in [Verbosity::Terse, Verbosity::Verbose] {
            let batch = validate_batch(&records, verbosity);
            assert_eq!(batch.expenses.len() + batch.skipped.len(), records.len());
            assert_eq!(batch.expenses.len(), 2);
            assert_eq!(
                batch.skipped.iter().map(|s| s.index).collect::<Vec<_>>(),
                vec![1, 2]
            );
            assert!(batch.expenses.iter().all(|e| !e.category.is_empty()));
        }
    }
}
