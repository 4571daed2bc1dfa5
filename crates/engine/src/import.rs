//! Record import — a validated batch of transactions, budgets and income.
//!
//! The whole batch is checked before anything is written, so a bad row
//! leaves the store untouched, and the rows go to the store as one batch. Income entries become income transactions;
//! there is no separate income table.

use chrono::NaiveDate;
use finpilot_core::error::{Error, Result};
use finpilot_core::records::{NewBudget, NewTransaction, UserId};
use finpilot_core::store::RecordStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The JSON document accepted by `finpilot import`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportBatch {
    #[serde(default)]
    pub transactions: Vec<NewTransaction>,
    #[serde(default)]
    pub budgets: Vec<NewBudget>,
    #[serde(default)]
    pub income: Vec<IncomeEntry>,
}

/// An income source as users tend to write it down.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomeEntry {
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl From<&IncomeEntry> for NewTransaction {
    fn from(entry: &IncomeEntry) -> Self {
        NewTransaction::income(entry.name.clone(), entry.amount, entry.date)
    }
}

/// How many records of each kind were written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub transactions: usize,
    pub budgets: usize,
    pub income: usize,
}

impl ImportBatch {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check every record, naming the first offending row.
    pub fn validate(&self) -> Result<()> {
        for (i, tx) in self.transactions.iter().enumerate() {
            tx.validate().map_err(|e| at_row("transactions", i, e))?;
        }
        for (i, budget) in self.budgets.iter().enumerate() {
            budget.validate().map_err(|e| at_row("budgets", i, e))?;
        }
        for (i, entry) in self.income.iter().enumerate() {
            NewTransaction::from(entry)
                .validate()
                .map_err(|e| at_row("income", i, e))?;
        }
        Ok(())
    }

    /// Validate, then write the batch for `user` in one store batch.
    ///
    /// Budgets go first so an existing category keeps its id. A storage
    /// failure part way through leaves nothing behind.
    pub async fn apply(self, store: &dyn RecordStore, user: &UserId) -> Result<ImportSummary> {
        self.validate()?;

        let summary = ImportSummary {
            transactions: self.transactions.len(),
            budgets: self.budgets.len(),
            income: self.income.len(),
        };
        let mut transactions = self.transactions;
        transactions.extend(self.income.iter().map(NewTransaction::from));

        store.write_batch(user, self.budgets, transactions).await?;

        info!(
            user = %user,
            store = store.name(),
            transactions = summary.transactions,
            budgets = summary.budgets,
            income = summary.income,
            "Import complete"
        );
        Ok(summary)
    }
}

fn at_row(section: &str, index: usize, error: Error) -> Error {
    match error {
        Error::Validation(message) => Error::Validation(format!("{section}[{index}]: {message}")),
        other => other,
    }
}
