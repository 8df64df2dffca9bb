//! Chat-facing text: menus, prompts, and report summaries.

use tally_analytics::Report;
use tally_core::{format_currency, Summary};

use crate::input::{ExpenseEntry, MonthQuery};
use crate::transport::InlineKeyboard;

pub const UNAUTHORIZED: &str = "❌ Unauthorized access!";
pub const USE_START: &str = "Please use /start to see the menu!";
pub const NO_EXPENSES: &str = "📭 No expenses found!";
pub const NO_DATA: &str = "📭 No data available!";
pub const CANCELLED: &str = "👌 Cancelled. Use /start to see the menu.";

/// Callback tags carried by inline buttons.
pub mod tags {
    pub const ADD_EXPENSE: &str = "add_expense";
    pub const VIEW_EXPENSES: &str = "view_expenses";
    pub const MONTHLY_SUMMARY: &str = "monthly_summary";
    pub const ANALYTICS: &str = "analytics";
    pub const ANA_CATEGORY: &str = "ana_category";
    pub const ANA_MONTHLY: &str = "ana_monthly";
    pub const ANA_STATS: &str = "ana_stats";
    pub const BACK_MENU: &str = "back_menu";
}

pub fn main_menu_keyboard() -> InlineKeyboard {
    InlineKeyboard::column(&[
        ("💰 Add Expense", tags::ADD_EXPENSE),
        ("📊 View All Expenses", tags::VIEW_EXPENSES),
        ("📈 Monthly Summary", tags::MONTHLY_SUMMARY),
        ("📉 Analytics", tags::ANALYTICS),
    ])
}

pub fn analytics_keyboard() -> InlineKeyboard {
    InlineKeyboard::column(&[
        ("📊 Category Distribution", tags::ANA_CATEGORY),
        ("📈 Monthly Trend", tags::ANA_MONTHLY),
        ("📉 Statistics", tags::ANA_STATS),
        ("🔙 Back to Menu", tags::BACK_MENU),
    ])
}

pub const WELCOME: &str = "🏦 *Expense Tracker Bot*\n\nWelcome! Choose an option below:";
pub const MENU: &str = "🏦 *Expense Tracker Bot*\n\nChoose an option:";
pub const ANALYTICS_MENU: &str = "📈 *Analytics Menu*\n\nChoose a visualization:";

pub const ADD_EXPENSE_PROMPT: &str = "💰 *Add New Expense*\n\n\
Please send expense details in this format:\n\
`Category Amount Note`\n\n\
Example:\n\
`Food 250 Lunch at restaurant`\n\
`Transport 50 Auto fare`\n\n\
Note is optional!";

pub const MONTH_PROMPT: &str = "📅 *Monthly Summary*\n\n\
Please send year and month:\n\
`YYYY MM`\n\n\
Example: `2025 10`";

/// Escape legacy-Markdown control characters in user-supplied text.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Renderer {
    symbol: String,
    recent_limit: usize,
}

impl Renderer {
    pub fn new(symbol: impl Into<String>, recent_limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            recent_limit,
        }
    }

    pub fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.symbol)
    }

    pub fn expense_added(&self, entry: &ExpenseEntry) -> String {
        let note = if entry.note.is_empty() {
            "N/A".to_string()
        } else {
            escape_markdown(&entry.note)
        };
        format!(
            "✅ *Expense Added!*\n\n📁 Category: {}\n💵 Amount: {}\n📝 Note: {}",
            escape_markdown(&entry.category),
            self.money(entry.amount),
            note
        )
    }

    /// A missing total renders as zero.
    pub fn month_total(&self, query: MonthQuery, total: Option<f64>) -> String {
        format!(
            "📅 *{}*\n\n💰 Total Expenses: `{}`",
            query.label(),
            self.money(total.unwrap_or(0.0))
        )
    }

    /// Newest expenses with a running total of the ones shown.
    pub fn recent(&self, report: &Report) -> String {
        let limit = self.recent_limit;
        let (shown, total) = report.recent(limit);

        let mut text = format!("📊 *Recent Expenses (Last {limit})*\n\n");
        for e in shown {
            text.push_str(&format!("🗓 {}\n", e.date.format("%d %b %Y")));
            text.push_str(&format!("📁 {}\n", escape_markdown(&e.category)));
            text.push_str(&format!("💵 {}\n", self.money(e.amount)));
            if !e.note.is_empty() {
                text.push_str(&format!("📝 {}\n", escape_markdown(&e.note)));
            }
            text.push_str("━━━━━━━━━━━━━━━━\n");
        }
        text.push_str(&format!("\n*Total (Last {limit}): {}*", self.money(total)));
        text
    }

    pub fn statistics(&self, summary: &Summary) -> String {
        format!(
            "📊 *EXPENSE STATISTICS*\n\n\
💰 Total Expenses: `{}`\n\
📅 Average: `{}`\n\
📈 Maximum: `{}`\n\
📉 Minimum: `{}`\n\
🔢 Transactions: `{}`\n\
🏆 Top Category: `{}`\n",
            self.money(summary.total),
            self.money(summary.mean),
            self.money(summary.max),
            self.money(summary.min),
            summary.count,
            summary.top_category.replace('`', "'"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_core::{RawRecord, Verbosity};

    fn report() -> Report {
        let rows: Vec<RawRecord> = serde_json::from_value(json!([
            {"time": "2025-10-03T09:00:00", "category": "Food", "amount": 1250.5, "note": "team_lunch"},
            {"time": "2025-10-02T18:30:00", "category": "Transport", "amount": "50"},
            {"time": "2025-09-30", "category": "Food", "amount": 100, "note": ""}
        ]))
        .unwrap();
        Report::build(&rows, Verbosity::Terse).unwrap()
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b *c* `d` [e]"), "a\\_b \\*c\\* \\`d\\` \\[e]");
    }

    #[test]
    fn test_recent_listing_caps_and_totals() {
        let text = Renderer::new("₹", 2).recent(&report());
        assert!(text.starts_with("📊 *Recent Expenses (Last 2)*"));
        assert!(text.contains("🗓 03 Oct 2025"));
        assert!(text.contains("📝 team\\_lunch"));
        assert!(!text.contains("30 Sep 2025"));
        assert!(text.ends_with("*Total (Last 2): ₹1,300.50*"));
    }

    #[test]
    fn test_statistics_text() {
        let text = Renderer::new("₹", 10).statistics(&report().summary());
        assert!(text.contains("💰 Total Expenses: `₹1,400.50`"));
        assert!(text.contains("📈 Maximum: `₹1,250.50`"));
        assert!(text.contains("📉 Minimum: `₹50.00`"));
        assert!(text.contains("🔢 Transactions: `3`"));
        assert!(text.contains("🏆 Top Category: `Food`"));
    }

    #[test]
    fn test_month_total_and_added() {
        let r = Renderer::new("₹", 10);
        let q = MonthQuery { year: 2025, month: 10 };
        assert_eq!(
            r.month_total(q, None),
            "📅 *October 2025*\n\n💰 Total Expenses: `₹0.00`"
        );
        let added = r.expense_added(&ExpenseEntry {
            category: "Food".to_string(),
            amount: 250.0,
            note: String::new(),
        });
        assert!(added.ends_with("📝 Note: N/A"));
        assert!(added.contains("💵 Amount: ₹250.00"));
    }
}
