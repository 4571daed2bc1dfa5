//! RecordStore trait — read and write access to one user's financial records.
//!
//! The store is the only owner of persisted records. Reads are scoped to a
//! single [`UserId`]; records belonging to other users are never returned.

use async_trait::async_trait;

use crate::error::DataAccessError;
use crate::records::{BudgetCategory, NewBudget, NewTransaction, Transaction, UserId, UserRecords};

/// The core RecordStore trait.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// All transactions for `user`, newest first (date desc, then id desc).
    async fn transactions(&self, user: &UserId)
    -> std::result::Result<Vec<Transaction>, DataAccessError>;

    /// All budget categories for `user`, as stored (`spent` not yet computed).
    async fn budget_categories(
        &self,
        user: &UserId,
    ) -> std::result::Result<Vec<BudgetCategory>, DataAccessError>;

    /// Append a transaction and return its id.
    async fn add_transaction(
        &self,
        user: &UserId,
        tx: NewTransaction,
    ) -> std::result::Result<i64, DataAccessError>;

    /// Create a budget, or update its amount when the category already exists.
    async fn upsert_budget(
        &self,
        user: &UserId,
        budget: NewBudget,
    ) -> std::result::Result<i64, DataAccessError>;

    /// Write `budgets`, then `transactions`, as one unit.
    ///
    /// Either every row is stored or none is.
    async fn write_batch(
        &self,
        user: &UserId,
        budgets: Vec<NewBudget>,
        transactions: Vec<NewTransaction>,
    ) -> std::result::Result<(), DataAccessError>;

    /// Load everything needed for one dashboard or chat turn.
    async fn load(&self, user: &UserId) -> std::result::Result<UserRecords, DataAccessError> {
        let transactions = self.transactions(user).await?;
        let budgets = self.budget_categories(user).await?;
        Ok(UserRecords::from_parts(transactions, budgets))
    }
}
