//! Expense record types: the untrusted store row and its validated form

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category used when a record carries a blank category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A row as returned by the remote store, before any checks.
///
/// Every field is kept as raw JSON so that a wrongly typed value surfaces
/// as a validation failure for that one record instead of a decode failure
/// for the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawRecord {
    /// Row identifier; stores name this `identifier`, `id` or `label`
    pub identifier: Option<Value>,
    /// ISO-8601 timestamp
    pub time: Option<Value>,
    pub category: Option<Value>,
    /// Number or numeric string
    pub amount: Option<Value>,
    pub note: Option<Value>,
}

impl From<Map<String, Value>> for RawRecord {
    fn from(mut row: Map<String, Value>) -> Self {
        let mut take = |key: &str| row.remove(key).filter(|v| !v.is_null());
        let identifier = take("identifier").or_else(|| take("id")).or_else(|| take("label"));
        Self {
            identifier,
            time: take("time"),
            category: take("category"),
            amount: take("amount"),
            note: take("note"),
        }
    }
}

impl RawRecord {
    /// Identifier rendered as text, if present.
    pub fn identifier_text(&self) -> Option<String> {
        self.identifier.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// An expense that passed field-presence and parse checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Calendar date of the spend; time-of-day is dropped
    pub date: NaiveDate,
    /// May be negative (refunds are not distinguished from entry errors)
    pub amount: f64,
    /// Trimmed, never empty
    pub category: String,
    /// Possibly empty
    pub note: String,
}

impl Expense {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        category: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            note: note.into(),
        }
    }

    /// Year-month bucket key, e.g. `2025-10`.
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_from_store_row() {
        let raw: RawRecord = serde_json::from_value(json!({
            "label": "b7f4",
            "time": "2025-10-01T10:00:00",
            "category": "Food",
            "amount": 250,
            "note": null,
            "extra": true
        }))
        .unwrap();
        assert_eq!(raw.identifier_text().as_deref(), Some("b7f4"));
        assert_eq!(raw.amount, Some(json!(250)));
        assert_eq!(raw.note, None);
    }

    #[test]
    fn test_identifier_prefers_explicit_name() {
        let raw: RawRecord =
            serde_json::from_value(json!({"identifier": 7, "id": 9, "label": "x"})).unwrap();
        assert_eq!(raw.identifier_text().as_deref(), Some("7"));
    }

    #[test]
    fn test_wrong_types_do_not_fail_decode() {
        let rows: Vec<RawRecord> = serde_json::from_value(json!([
            {"time": 12, "category": ["a"], "amount": {"x": 1}},
            {}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], RawRecord::default());
    }

    #[test]
    fn test_month_key() {
        let e = Expense::new(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(), 1.0, "Food", "");
        assert_eq!(e.month_key(), "2025-03");
    }
}
