//! Subcommand implementations. Output is plain text on stdout.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::path::Path;
use tally_analytics::{ChartRenderer, Report, SvgChartRenderer};
use tally_core::{format_currency, ConversationStore, Summary, Verbosity};
use tally_store::{ExpensePatch, ExpenseStore, NewExpense, PostgrestStore};
use tracing::error;

use crate::config::{Config, Environment};
use crate::dispatcher::{DispatchSettings, Dispatcher};
use crate::input::MonthQuery;
use crate::render::Renderer;
use crate::telegram::TelegramClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Pie of the top categories plus "Other"
    Category,
    /// Line of monthly totals
    Monthly,
    /// Bars per expense by date
    Daily,
}

pub fn open_store(env: &Environment, cfg: &Config) -> Result<PostgrestStore> {
    let store_cfg = env.store_config(cfg)?;
    PostgrestStore::new(store_cfg).context("create store client")
}

/// Run the long-poll bot until Ctrl-C.
pub async fn run_bot(env: &Environment, cfg: &Config, verbosity: Verbosity) -> Result<()> {
    // both halves are required before anything is started
    let store = open_store(env, cfg)?;
    let creds = env.bot_credentials()?;
    let telegram = TelegramClient::new(&creds.token)?;

    let symbol = cfg.report.currency_symbol.clone();
    let charts = SvgChartRenderer::new(symbol.clone());
    let mut conversations = ConversationStore::new();
    let settings = DispatchSettings {
        authorized_chat: creds.authorized_chat,
        poll_timeout_secs: cfg.bot.poll_timeout_secs,
        idle_pause: cfg.bot.idle_pause(),
        error_backoff: cfg.bot.error_backoff(),
        category_top_k: cfg.bot.category_chart_top_k,
        verbosity,
    };

    let mut dispatcher = Dispatcher::new(
        &telegram,
        &store,
        &charts,
        &mut conversations,
        Renderer::new(symbol, cfg.bot.recent_limit),
        settings,
    );

    println!("Starting Expense Tracker Bot. Press Ctrl+C to stop.");
    dispatcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    println!("Bot stopped.");
    Ok(())
}

pub async fn add(
    store: &dyn ExpenseStore,
    category: &str,
    amount: f64,
    note: &str,
    symbol: &str,
) -> Result<()> {
    if category.trim().is_empty() {
        bail!("category must not be empty");
    }
    if !amount.is_finite() {
        bail!("amount must be a finite number");
    }

    let row = NewExpense::now(category, amount, note);
    let stored = store.insert(&row).await.context("insert expense")?;
    println!(
        "Added {} {} (id {})",
        row.category,
        format_currency(row.amount, symbol),
        stored.identifier_text().unwrap_or_else(|| "?".to_string())
    );
    Ok(())
}

pub async fn update(store: &dyn ExpenseStore, id: &str, patch: ExpensePatch) -> Result<()> {
    if patch.amount.is_some_and(|a| !a.is_finite()) {
        bail!("amount must be a finite number");
    }
    store
        .update(id, &patch)
        .await
        .with_context(|| format!("update expense {id}"))?;
    println!("Updated expense {id}");
    Ok(())
}

pub async fn month(store: &dyn ExpenseStore, year: i32, month: u32, symbol: &str) -> Result<()> {
    let query = MonthQuery::new(year, month)?;
    let total = store
        .monthly_total(query.year, query.month)
        .await
        .context("monthly total")?;
    println!(
        "{}: {}",
        query.label(),
        format_currency(total.unwrap_or(0.0), symbol)
    );
    Ok(())
}

/// `None` when the store has no rows at all.
async fn load_report(store: &dyn ExpenseStore, verbosity: Verbosity) -> Result<Option<Report>> {
    let rows = store.fetch_all().await.context("fetch expenses")?;
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(Report::build(&rows, verbosity)?))
}

pub async fn list(
    store: &dyn ExpenseStore,
    limit: usize,
    symbol: &str,
    verbosity: Verbosity,
) -> Result<()> {
    match load_report(store, verbosity).await? {
        Some(report) => print!("{}", format_listing(&report, limit, symbol)),
        None => println!("No expenses found."),
    }
    Ok(())
}

pub async fn stats(store: &dyn ExpenseStore, symbol: &str, verbosity: Verbosity) -> Result<()> {
    match load_report(store, verbosity).await? {
        Some(report) => {
            print!("{}", format_stats(&report.summary(), symbol));
            if report.skipped > 0 {
                println!("({} invalid rows skipped)", report.skipped);
            }
        }
        None => println!("No data available."),
    }
    Ok(())
}

pub async fn chart(
    store: &dyn ExpenseStore,
    kind: ChartKind,
    out: &Path,
    cfg: &Config,
    verbosity: Verbosity,
) -> Result<()> {
    let report = load_report(store, verbosity)
        .await?
        .context("no expenses to chart")?;
    let renderer = SvgChartRenderer::new(cfg.report.currency_symbol.clone());

    let image = match kind {
        ChartKind::Category => {
            renderer.category_chart(&report.category_slices(cfg.report.cli_category_top_k))
        }
        ChartKind::Monthly => renderer.monthly_chart(&report.aggregates.monthly_series()),
        ChartKind::Daily => renderer.daily_chart(&report.aggregates.daily_series()),
    }
    .with_context(|| format!("render {kind:?} chart"))?;

    fs::write(out, &image.bytes).with_context(|| format!("write {}", out.display()))?;
    println!("Wrote {} ({} bytes)", out.display(), image.bytes.len());
    Ok(())
}

fn format_listing(report: &Report, limit: usize, symbol: &str) -> String {
    let (shown, total) = report.recent(limit);
    let mut out = String::new();
    for e in shown {
        let line = format!(
            "{}  {:<16} {:>14}  {}",
            e.date,
            e.category,
            format_currency(e.amount, symbol),
            e.note
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(&format!(
        "\nTotal (last {}): {}\n",
        shown.len(),
        format_currency(total, symbol)
    ));
    out
}

fn format_stats(summary: &Summary, symbol: &str) -> String {
    let money = |v: f64| format_currency(v, symbol);
    format!(
        "Total:         {}\n\
Average:       {}\n\
Maximum:       {}\n\
Minimum:       {}\n\
Transactions:  {}\n\
Top category:  {}\n",
        money(summary.total),
        money(summary.mean),
        money(summary.max),
        money(summary.min),
        summary.count,
        summary.top_category
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_core::RawRecord;

    fn report() -> Report {
        let rows: Vec<RawRecord> = serde_json::from_value(json!([
            {"time": "2025-10-02T18:30:00", "category": "Transport", "amount": 50, "note": "Auto fare"},
            {"time": "2025-10-01T10:00", "category": "Food", "amount": "250"},
            {"time": "2025-10-01", "category": "Food", "amount": "abc"}
        ]))
        .unwrap();
        Report::build(&rows, Verbosity::Terse).unwrap()
    }

    #[test]
    fn test_format_listing() {
        let out = format_listing(&report(), 10, "₹");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("2025-10-02  Transport"));
        assert!(lines[0].ends_with("₹50.00  Auto fare"));
        assert!(lines[1].ends_with("₹250.00"));
        assert_eq!(lines.last(), Some(&"Total (last 2): ₹300.00"));
    }

    #[test]
    fn test_format_listing_limit() {
        let out = format_listing(&report(), 1, "$");
        assert!(out.ends_with("Total (last 1): $50.00\n"));
    }

    #[test]
    fn test_format_stats() {
        let r = report();
        assert_eq!(r.skipped, 1);
        let out = format_stats(&r.summary(), "₹");
        assert!(out.contains("Average:       ₹150.00"));
        assert!(out.contains("Transactions:  2"));
        assert!(out.contains("Top category:  Food"));
    }
}
