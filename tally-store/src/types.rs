use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where and how to reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// API key sent as both `apikey` and bearer token
    pub key: String,
    pub table: String,
    /// Column matched by `update`
    pub id_column: String,
    /// Name of the `(p_year, p_month) -> numeric` function
    pub monthly_total_rpc: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            table: "expenses".to_string(),
            id_column: "id".to_string(),
            monthly_total_rpc: "get_monthly_total".to_string(),
        }
    }
}

/// Row payload for an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    /// ISO-8601 local timestamp
    pub time: String,
    pub category: String,
    pub amount: f64,
    pub note: String,
}

impl NewExpense {
    /// Build an insert payload stamped with `at`. Category and note are trimmed.
    pub fn at(at: NaiveDateTime, category: &str, amount: f64, note: &str) -> Self {
        Self {
            time: at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            category: category.trim().to_string(),
            amount,
            note: note.trim().to_string(),
        }
    }

    /// Build an insert payload stamped with the current local time.
    pub fn now(category: &str, amount: f64, note: &str) -> Self {
        Self::at(chrono::Local::now().naive_local(), category, amount, note)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.amount.is_none() && self.note.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_expense_trims_and_stamps() {
        let at = NaiveDate::from_ymd_opt(2025, 10, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let e = NewExpense::at(at, " Food ", 250.0, " Lunch ");
        assert_eq!(e.time, "2025-10-01T10:00:00.000000");
        assert_eq!(e.category, "Food");
        assert_eq!(e.note, "Lunch");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ExpensePatch {
            amount: Some(25.5),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"amount":25.5}"#);
        assert!(ExpensePatch::default().is_empty());
    }
}
