//! Long-poll update loop and per-update routing.
//!
//! One batch is fetched at a time and handled to completion, in arrival order,
//! before the next fetch. The cursor moves past each update as soon as it has
//! been handled, so nothing already seen is requested again. Shutdown is only
//! observed while waiting (fetch or pause), never in the middle of a batch.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tally_analytics::{ChartRenderer, Report};
use tally_core::{ChatId, ConversationStore, Mode, ReportError, Verbosity};
use tally_store::{ExpenseStore, NewExpense};
use tracing::{debug, error, info, warn};

use crate::input::{parse_expense_input, parse_month_input};
use crate::render::{self, tags, Renderer};
use crate::transport::{CallbackQuery, ChatTransport, InlineKeyboard, Update};

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// The only chat allowed to use the bot
    pub authorized_chat: ChatId,
    pub poll_timeout_secs: u64,
    pub idle_pause: Duration,
    pub error_backoff: Duration,
    /// Slices shown in the category pie before folding into "Other"
    pub category_top_k: usize,
    pub verbosity: Verbosity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    AddExpense,
    ViewExpenses,
    MonthlySummary,
    Analytics,
    CategoryChart,
    MonthlyChart,
    Statistics,
    BackToMenu,
}

impl Action {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            tags::ADD_EXPENSE => Some(Action::AddExpense),
            tags::VIEW_EXPENSES => Some(Action::ViewExpenses),
            tags::MONTHLY_SUMMARY => Some(Action::MonthlySummary),
            tags::ANALYTICS => Some(Action::Analytics),
            tags::ANA_CATEGORY => Some(Action::CategoryChart),
            tags::ANA_MONTHLY => Some(Action::MonthlyChart),
            tags::ANA_STATS => Some(Action::Statistics),
            tags::BACK_MENU => Some(Action::BackToMenu),
            _ => None,
        }
    }
}

/// `/start@my_bot args` -> `start`
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let cmd = first.strip_prefix('/')?;
    Some(cmd.split('@').next().unwrap_or(cmd))
}

pub struct Dispatcher<'a> {
    transport: &'a dyn ChatTransport,
    store: &'a dyn ExpenseStore,
    charts: &'a dyn ChartRenderer,
    conversations: &'a mut ConversationStore,
    renderer: Renderer,
    settings: DispatchSettings,
    cursor: Option<i64>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        transport: &'a dyn ChatTransport,
        store: &'a dyn ExpenseStore,
        charts: &'a dyn ChartRenderer,
        conversations: &'a mut ConversationStore,
        renderer: Renderer,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            transport,
            store,
            charts,
            conversations,
            renderer,
            settings,
            cursor: None,
        }
    }

    /// Next update id to request, if any update has been handled.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Poll and handle updates until `shutdown` resolves.
    ///
    /// Fetch failures are logged and retried after the backoff pause; they
    /// never end the loop.
    pub async fn run<F: Future>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);
        info!(authorized_chat = self.settings.authorized_chat, "bot is running");

        loop {
            let fetched = tokio::select! {
                _ = &mut shutdown => break,
                res = self.transport.get_updates(self.cursor, self.settings.poll_timeout_secs) => res,
            };

            let pause = match fetched {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "received updates");
                    }
                    self.process_batch(updates).await;
                    self.settings.idle_pause
                }
                Err(e) => {
                    error!(error = %format!("{e:#}"), "fetching updates failed");
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(cursor = ?self.cursor(), "bot stopped");
    }

    /// Handle a batch in arrival order, advancing the cursor past each update.
    pub async fn process_batch(&mut self, updates: Vec<Update>) {
        for update in updates {
            let update_id = update.update_id;
            if let Err(e) = self.handle_update(update).await {
                warn!(update_id, error = %format!("{e:#}"), "handling update failed");
            }
            self.cursor = Some(update_id + 1);
        }
    }

    async fn handle_update(&mut self, update: Update) -> Result<()> {
        if let Some(message) = update.message {
            match message.text {
                Some(text) => self.handle_text(message.chat.id, &text).await,
                None => Ok(()),
            }
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await
        } else {
            debug!(update_id = update.update_id, "ignoring unsupported update");
            Ok(())
        }
    }

    fn is_authorized(&self, chat_id: ChatId) -> bool {
        chat_id == self.settings.authorized_chat
    }

    async fn refuse(&self, chat_id: ChatId) -> Result<()> {
        warn!(chat_id, "unauthorized update");
        self.send(chat_id, render::UNAUTHORIZED).await
    }

    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.transport.send_text(chat_id, text, None).await
    }

    async fn send_with(&self, chat_id: ChatId, text: &str, keyboard: &InlineKeyboard) -> Result<()> {
        self.transport.send_text(chat_id, text, Some(keyboard)).await
    }

    async fn handle_text(&mut self, chat_id: ChatId, text: &str) -> Result<()> {
        if !self.is_authorized(chat_id) {
            return self.refuse(chat_id).await;
        }

        match command_name(text) {
            Some("start") | Some("menu") => {
                self.conversations.clear(chat_id);
                return self
                    .send_with(chat_id, render::WELCOME, &render::main_menu_keyboard())
                    .await;
            }
            Some("cancel") => {
                self.conversations.clear(chat_id);
                return self.send(chat_id, render::CANCELLED).await;
            }
            _ => {}
        }

        match self.conversations.get(chat_id) {
            Some(Mode::AwaitingExpenseEntry) => self.handle_expense_input(chat_id, text).await,
            Some(Mode::AwaitingMonthQuery) => self.handle_month_input(chat_id, text).await,
            None => self.send(chat_id, render::USE_START).await,
        }
    }

    async fn handle_callback(&mut self, query: CallbackQuery) -> Result<()> {
        // ack first so the button never looks stuck, whoever pressed it
        if let Err(e) = self.transport.answer_callback(&query.id).await {
            warn!(error = %format!("{e:#}"), "answering callback failed");
        }

        let Some(chat_id) = query.message.as_ref().map(|m| m.chat.id) else {
            debug!("callback without a message");
            return Ok(());
        };
        if !self.is_authorized(chat_id) {
            return self.refuse(chat_id).await;
        }

        let tag = query.data.as_deref().unwrap_or_default();
        let Some(action) = Action::from_tag(tag) else {
            debug!(chat_id, tag, "ignoring unknown callback tag");
            return Ok(());
        };
        debug!(chat_id, ?action, "callback");

        match action {
            Action::AddExpense => {
                self.conversations.set(chat_id, Mode::AwaitingExpenseEntry);
                self.send(chat_id, render::ADD_EXPENSE_PROMPT).await
            }
            Action::MonthlySummary => {
                self.conversations.set(chat_id, Mode::AwaitingMonthQuery);
                self.send(chat_id, render::MONTH_PROMPT).await
            }
            Action::ViewExpenses => self.show_recent(chat_id).await,
            Action::Analytics => {
                self.send_with(chat_id, render::ANALYTICS_MENU, &render::analytics_keyboard())
                    .await
            }
            Action::CategoryChart => self.send_category_chart(chat_id).await,
            Action::MonthlyChart => self.send_monthly_chart(chat_id).await,
            Action::Statistics => self.send_statistics(chat_id).await,
            Action::BackToMenu => {
                self.send_with(chat_id, render::MENU, &render::main_menu_keyboard())
                    .await
            }
        }
    }

    /// Mode state is cleared only once the expense is stored.
    async fn handle_expense_input(&mut self, chat_id: ChatId, text: &str) -> Result<()> {
        let entry = match parse_expense_input(text) {
            Ok(entry) => entry,
            Err(e) => return self.send(chat_id, &e.to_string()).await,
        };

        let row = NewExpense::now(&entry.category, entry.amount, &entry.note);
        if let Err(e) = self.store.insert(&row).await {
            error!(chat_id, error = %e, "storing expense failed");
            return self.send(chat_id, &format!("❌ Error: {e}")).await;
        }

        self.conversations.clear(chat_id);
        info!(chat_id, category = %row.category, amount = row.amount, "expense stored");
        self.send(chat_id, &self.renderer.expense_added(&entry)).await
    }

    async fn handle_month_input(&mut self, chat_id: ChatId, text: &str) -> Result<()> {
        let query = match parse_month_input(text) {
            Ok(query) => query,
            Err(e) => return self.send(chat_id, &e.to_string()).await,
        };

        let total = match self.store.monthly_total(query.year, query.month).await {
            Ok(total) => total,
            Err(e) => {
                error!(chat_id, error = %e, "monthly total failed");
                return self.send(chat_id, &format!("❌ Error: {e}")).await;
            }
        };

        self.conversations.clear(chat_id);
        self.send(chat_id, &self.renderer.month_total(query, total)).await
    }

    /// Fetch and validate every row. Failures are reported to the chat and
    /// yield `None`.
    async fn load_report(&self, chat_id: ChatId, when_empty: &str) -> Result<Option<Report>> {
        let rows = match self.store.fetch_all().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(chat_id, error = %e, "fetching expenses failed");
                self.send(chat_id, &format!("❌ Error: {e}")).await?;
                return Ok(None);
            }
        };
        if rows.is_empty() {
            self.send(chat_id, when_empty).await?;
            return Ok(None);
        }

        match Report::build(&rows, self.settings.verbosity) {
            Ok(report) => Ok(Some(report)),
            Err(ReportError::NoValidData) => {
                warn!(chat_id, rows = rows.len(), "no valid expense rows");
                self.send(chat_id, when_empty).await?;
                Ok(None)
            }
        }
    }

    async fn show_recent(&self, chat_id: ChatId) -> Result<()> {
        let Some(report) = self.load_report(chat_id, render::NO_EXPENSES).await? else {
            return Ok(());
        };
        self.send(chat_id, &self.renderer.recent(&report)).await
    }

    async fn send_statistics(&self, chat_id: ChatId) -> Result<()> {
        let Some(report) = self.load_report(chat_id, render::NO_DATA).await? else {
            return Ok(());
        };
        self.send(chat_id, &self.renderer.statistics(&report.summary()))
            .await
    }

    async fn send_category_chart(&self, chat_id: ChatId) -> Result<()> {
        self.send(chat_id, "⏳ Generating category chart...").await?;
        let Some(report) = self.load_report(chat_id, render::NO_DATA).await? else {
            return Ok(());
        };

        let slices = report.category_slices(self.settings.category_top_k);
        match self.charts.category_chart(&slices) {
            Ok(image) => {
                self.transport
                    .send_image(chat_id, &image, Some("📊 Category Distribution"))
                    .await
            }
            Err(e) => {
                warn!(chat_id, error = %e, "category chart failed");
                self.send(chat_id, &format!("❌ Error generating chart: {e}"))
                    .await
            }
        }
    }

    async fn send_monthly_chart(&self, chat_id: ChatId) -> Result<()> {
        self.send(chat_id, "⏳ Generating monthly trend...").await?;
        let Some(report) = self.load_report(chat_id, render::NO_DATA).await? else {
            return Ok(());
        };

        match self
            .charts
            .monthly_chart(&report.aggregates.monthly_series())
        {
            Ok(image) => {
                self.transport
                    .send_image(chat_id, &image, Some("📈 Monthly Trend"))
                    .await
            }
            Err(e) => {
                warn!(chat_id, error = %e, "monthly chart failed");
                self.send(chat_id, &format!("❌ Error generating chart: {e}"))
                    .await
            }
        }
    }
}
