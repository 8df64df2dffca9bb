//! tally-store: access to the remote `expenses` collection.

pub mod error;
pub mod postgrest;
pub mod types;

use async_trait::async_trait;
use tally_core::RawRecord;

pub use error::StoreError;
pub use postgrest::PostgrestStore;
pub use types::{ExpensePatch, NewExpense, StoreConfig};

/// Operations the application needs from the record store.
///
/// Every call reflects the store's state at call time; nothing is cached.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Insert one expense and return the stored row.
    async fn insert(&self, expense: &NewExpense) -> Result<RawRecord, StoreError>;

    /// All rows, newest first.
    async fn fetch_all(&self) -> Result<Vec<RawRecord>, StoreError>;

    /// Apply a partial update to the row with identifier `id`.
    async fn update(&self, id: &str, patch: &ExpensePatch) -> Result<(), StoreError>;

    /// Server-side total for one calendar month; `None` when there is nothing to sum.
    async fn monthly_total(&self, year: i32, month: u32) -> Result<Option<f64>, StoreError>;
}
