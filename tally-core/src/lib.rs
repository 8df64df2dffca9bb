//! tally-core: expense types, record validation, aggregation and conversation state

pub mod aggregate;
pub mod conversation;
pub mod error;
pub mod expense;
pub mod money;
pub mod validate;

pub use aggregate::{aggregate, Aggregates, CategoryTotals, Summary, OTHER_BUCKET};
pub use conversation::{ChatId, ConversationStore, Mode};
pub use error::{ReportError, ValidationError};
pub use expense::{Expense, RawRecord, UNCATEGORIZED};
pub use money::{format_currency, format_inr, DEFAULT_SYMBOL};
pub use validate::{validate_batch, validate_record, Skipped, ValidatedBatch, Verbosity};
