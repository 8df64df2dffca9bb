//! Aggregation engine: one linear pass over validated expenses producing the
//! daily series, per-category totals and per-month totals.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::error::ReportError;
use crate::expense::Expense;

/// Label of the bucket that collects categories outside the top K.
pub const OTHER_BUCKET: &str = "Other";

/// Per-category sums, remembering first-seen order for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl CategoryTotals {
    pub fn add(&mut self, category: &str, amount: f64) {
        match self.index.get(category) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), amount));
            }
        }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.index.get(category).map(|&i| self.entries[i].1)
    }

    /// Buckets in first-encountered order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    /// Category with the largest total; the first one seen wins a tie.
    pub fn top(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(c, _)| c.as_str())
    }

    /// Keep the `k` largest buckets (descending, ties in first-seen order)
    /// and fold the rest into a single [`OTHER_BUCKET`].
    pub fn top_k_with_other(&self, k: usize) -> Vec<(String, f64)> {
        let mut sorted = self.entries.clone();
        // stable sort keeps first-seen order among equal totals
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        if sorted.len() <= k {
            return sorted;
        }

        let other: f64 = sorted[k..].iter().map(|(_, v)| v).sum();
        sorted.truncate(k);
        sorted.push((OTHER_BUCKET.to_string(), other));
        sorted
    }
}

/// Summary statistics derived from the daily series.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
    pub top_category: String,
}

/// Everything a report needs, computed in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    /// Same order as the input; never re-sorted
    pub dates: Vec<NaiveDate>,
    pub amounts: Vec<f64>,
    pub categories: Vec<String>,
    pub category_totals: CategoryTotals,
    /// Keyed by `YYYY-MM`, so key order is chronological
    pub monthly_totals: BTreeMap<String, f64>,
}

/// Aggregate a non-empty slice of validated expenses.
pub fn aggregate(expenses: &[Expense]) -> Result<Aggregates, ReportError> {
    if expenses.is_empty() {
        return Err(ReportError::NoValidData);
    }

    let mut agg = Aggregates {
        dates: Vec::with_capacity(expenses.len()),
        amounts: Vec::with_capacity(expenses.len()),
        categories: Vec::with_capacity(expenses.len()),
        category_totals: CategoryTotals::default(),
        monthly_totals: BTreeMap::new(),
    };

    for e in expenses {
        agg.dates.push(e.date);
        agg.amounts.push(e.amount);
        agg.categories.push(e.category.clone());
        agg.category_totals.add(&e.category, e.amount);
        *agg.monthly_totals.entry(e.month_key()).or_insert(0.0) += e.amount;
    }

    Ok(agg)
}

impl Aggregates {
    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    pub fn count(&self) -> usize {
        self.amounts.len()
    }

    /// Months in chronological order with their totals.
    pub fn monthly_series(&self) -> Vec<(String, f64)> {
        self.monthly_totals
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Dates paired with amounts, in input order.
    pub fn daily_series(&self) -> Vec<(NaiveDate, f64)> {
        self.dates
            .iter()
            .copied()
            .zip(self.amounts.iter().copied())
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let total = self.total();
        let count = self.count();
        let max = self.amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.amounts.iter().copied().fold(f64::INFINITY, f64::min);
        Summary {
            total,
            mean: total / count as f64,
            max,
            min,
            count,
            top_category: self.category_totals.top().unwrap_or_default().to_string(),
        }
    }
}
