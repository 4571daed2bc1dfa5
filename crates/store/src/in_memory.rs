//! In-memory record store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use finpilot_core::error::DataAccessError;
use finpilot_core::records::{BudgetCategory, NewBudget, NewTransaction, Transaction, UserId};
use finpilot_core::store::RecordStore;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    next_id: i64,
    transactions: HashMap<UserId, Vec<Transaction>>,
    budgets: HashMap<UserId, Vec<BudgetCategory>>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_transaction(&mut self, user: &UserId, tx: NewTransaction) -> i64 {
        let id = self.allocate_id();
        self.transactions
            .entry(user.clone())
            .or_default()
            .push(Transaction {
                id,
                date: tx.date,
                description: tx.description,
                amount: tx.amount,
                category: tx.category,
                kind: tx.kind,
                payment_mode: tx.payment_mode,
                status: tx.status,
            });
        id
    }

    fn upsert_budget(&mut self, user: &UserId, budget: NewBudget) -> i64 {
        let existing = self
            .budgets
            .get_mut(user)
            .and_then(|list| list.iter_mut().find(|b| b.name == budget.name));

        if let Some(row) = existing {
            row.budget = budget.budget;
            if budget.color.is_some() {
                row.color = budget.color;
            }
            if budget.icon.is_some() {
                row.icon = budget.icon;
            }
            return row.id;
        }

        let id = self.allocate_id();
        self.budgets.entry(user.clone()).or_default().push(BudgetCategory {
            id,
            name: budget.name,
            budget: budget.budget,
            spent: Decimal::ZERO,
            color: budget.color,
            icon: budget.icon,
        });
        id
    }
}

/// A record store that keeps everything in process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed transaction, keeping its id. Used to seed tests.
    pub async fn insert_transaction(&self, user: &UserId, tx: Transaction) {
        let mut tables = self.tables.write().await;
        tables.next_id = tables.next_id.max(tx.id);
        tables.transactions.entry(user.clone()).or_default().push(tx);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>, DataAccessError> {
        let tables = self.tables.read().await;
        let mut txs = tables.transactions.get(user).cloned().unwrap_or_default();
        txs.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(txs)
    }

    async fn budget_categories(
        &self,
        user: &UserId,
    ) -> Result<Vec<BudgetCategory>, DataAccessError> {
        let tables = self.tables.read().await;
        let mut budgets = tables.budgets.get(user).cloned().unwrap_or_default();
        budgets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(budgets)
    }

    async fn add_transaction(
        &self,
        user: &UserId,
        tx: NewTransaction,
    ) -> Result<i64, DataAccessError> {
        Ok(self.tables.write().await.push_transaction(user, tx))
    }

    async fn upsert_budget(&self, user: &UserId, budget: NewBudget) -> Result<i64, DataAccessError> {
        Ok(self.tables.write().await.upsert_budget(user, budget))
    }

    async fn write_batch(
        &self,
        user: &UserId,
        budgets: Vec<NewBudget>,
        transactions: Vec<NewTransaction>,
    ) -> Result<(), DataAccessError> {
        // One lock for the whole batch, so readers see all of it or none.
        let mut tables = self.tables.write().await;
        for budget in budgets {
            tables.upsert_budget(user, budget);
        }
        for tx in transactions {
            tables.push_transaction(user, tx);
        }
        Ok(())
    }
}
