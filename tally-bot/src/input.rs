//! Free-text grammars for the two multi-step modes.

use chrono::NaiveDate;
use thiserror::Error;

/// Why a free-text reply could not be used. `Display` is the chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("❌ Invalid format!\n\nUse: `Category Amount Note`\nExample: `Food 250 Lunch`")]
    ExpenseFormat,
    #[error("❌ Invalid amount! Please enter a valid number.")]
    InvalidAmount,
    #[error("❌ Invalid format!\n\nUse: `YYYY MM`\nExample: `2025 10`")]
    MonthFormat,
    #[error("❌ Month must be between 1 and 12!")]
    MonthOutOfRange,
    #[error("❌ Invalid year or month! Please enter valid numbers.")]
    InvalidYearMonth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    pub category: String,
    pub amount: f64,
    /// Empty when omitted
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

impl MonthQuery {
    /// Month must be 1..=12 and the year within the calendar's range.
    pub fn new(year: i32, month: u32) -> Result<Self, InputError> {
        if !(1..=12).contains(&month) {
            return Err(InputError::MonthOutOfRange);
        }
        let query = Self { year, month };
        if query.first_day().is_none() {
            return Err(InputError::InvalidYearMonth);
        }
        Ok(query)
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// e.g. `October 2025`
    pub fn label(self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }
}

/// Split off the first whitespace-delimited token; the rest keeps its inner spacing.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], s[i..].trim_start())),
        None => Some((s, "")),
    }
}

/// `<category> <amount> [note...]`
pub fn parse_expense_input(text: &str) -> Result<ExpenseEntry, InputError> {
    let (category, rest) = next_token(text).ok_or(InputError::ExpenseFormat)?;
    let (amount, note) = next_token(rest).ok_or(InputError::ExpenseFormat)?;

    let amount: f64 = amount.parse().map_err(|_| InputError::InvalidAmount)?;
    if !amount.is_finite() {
        return Err(InputError::InvalidAmount);
    }

    Ok(ExpenseEntry {
        category: category.to_string(),
        amount,
        note: note.trim_end().to_string(),
    })
}

/// `<year> <month>`, month in 1..=12.
pub fn parse_month_input(text: &str) -> Result<MonthQuery, InputError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [year, month] = parts.as_slice() else {
        return Err(InputError::MonthFormat);
    };

    let year: i32 = year.parse().map_err(|_| InputError::InvalidYearMonth)?;
    let month: u32 = month.parse().map_err(|_| InputError::InvalidYearMonth)?;
    MonthQuery::new(year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_with_multiword_note() {
        let e = parse_expense_input("  Food 250   Lunch at  the canteen ").unwrap();
        assert_eq!(e.category, "Food");
        assert_eq!(e.amount, 250.0);
        assert_eq!(e.note, "Lunch at  the canteen");
    }

    #[test]
    fn test_expense_note_optional() {
        let e = parse_expense_input("Transport 49.5").unwrap();
        assert_eq!(e.amount, 49.5);
        assert_eq!(e.note, "");
    }

    #[test]
    fn test_expense_errors() {
        assert_eq!(parse_expense_input("Food"), Err(InputError::ExpenseFormat));
        assert_eq!(parse_expense_input("   "), Err(InputError::ExpenseFormat));
        assert_eq!(parse_expense_input("Food abc"), Err(InputError::InvalidAmount));
        assert_eq!(parse_expense_input("Food NaN"), Err(InputError::InvalidAmount));
        assert_eq!(parse_expense_input("Food inf x"), Err(InputError::InvalidAmount));
    }

    #[test]
    fn test_negative_and_zero_amounts_parse() {
        assert_eq!(parse_expense_input("Refund -120").unwrap().amount, -120.0);
        assert_eq!(parse_expense_input("Free 0").unwrap().amount, 0.0);
    }

    #[test]
    fn test_month_query() {
        assert_eq!(
            parse_month_input(" 2025  10 "),
            Ok(MonthQuery { year: 2025, month: 10 })
        );
        assert_eq!(parse_month_input("2025 13"), Err(InputError::MonthOutOfRange));
        assert_eq!(parse_month_input("2025 0"), Err(InputError::MonthOutOfRange));
        assert_eq!(parse_month_input("2025"), Err(InputError::MonthFormat));
        assert_eq!(parse_month_input("2025 10 1"), Err(InputError::MonthFormat));
        assert_eq!(parse_month_input("twenty 10"), Err(InputError::InvalidYearMonth));
        assert_eq!(parse_month_input("2025 -1"), Err(InputError::InvalidYearMonth));
        assert_eq!(parse_month_input("999999 5"), Err(InputError::InvalidYearMonth));
    }

    #[test]
    fn test_error_text_is_user_facing() {
        assert_eq!(
            InputError::MonthOutOfRange.to_string(),
            "❌ Month must be between 1 and 12!"
        );
    }
}
