//! Financial record types.
//!
//! Transactions are the single source of truth. Budget `spent` totals and
//! income sources are projections recomputed from transactions on every
//! read, so the two can never drift apart.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of the user who owns a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a transaction moved money in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Whether `amount` carries the sign this kind requires.
    pub fn accepts(self, amount: Decimal) -> bool {
        match self {
            TransactionKind::Income => amount > Decimal::ZERO,
            TransactionKind::Expense => amount < Decimal::ZERO,
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction_type '{other}'")),
        }
    }
}

/// A stored transaction. Positive amounts are income, negative are expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Decimal,
    /// Free-text label; never validated against a fixed list.
    pub category: String,
    #[serde(rename = "transaction_type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A per-category budget. `spent` is recomputed from transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub id: i64,
    pub name: String,
    pub budget: Decimal,
    #[serde(default)]
    pub spent: Decimal,
    /// Presentation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Presentation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Read-only projection of one income transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    /// Id of the transaction this entry is derived from.
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl IncomeSource {
    /// Project an income transaction. Returns `None` for expenses.
    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        (tx.kind == TransactionKind::Income).then(|| Self {
            id: tx.id,
            name: tx.category.clone(),
            amount: tx.amount,
            date: tx.date,
        })
    }
}

/// Everything one store read returns for a single user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecords {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<BudgetCategory>,
    pub income: Vec<IncomeSource>,
}

impl UserRecords {
    /// Bundle raw store rows, recomputing budget spend and income sources.
    pub fn from_parts(transactions: Vec<Transaction>, mut budgets: Vec<BudgetCategory>) -> Self {
        for budget in &mut budgets {
            budget.spent = spent_in_category(&transactions, &budget.name);
        }
        let income = transactions
            .iter()
            .filter_map(IncomeSource::from_transaction)
            .collect();
        Self {
            transactions,
            budgets,
            income,
        }
    }
}

/// Sum of `|amount|` over expense transactions in `category`.
pub fn spent_in_category(transactions: &[Transaction], category: &str) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense && t.category == category)
        .map(|t| t.amount.abs())
        .sum()
}

// --- Write-side inputs ---

/// A transaction to be recorded. Validated before it reaches a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "transaction_type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "transaction_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_mode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewTransaction {
    /// Record income under `name`; the name becomes the category.
    pub fn income(name: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        let name = name.into();
        Self {
            kind: TransactionKind::Income,
            amount,
            description: Some(format!("{name} Credit")),
            category: name,
            date,
            payment_mode: None,
            status: None,
        }
    }

    /// Reject records the aggregation engine must never see.
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(Error::Validation("category must not be empty".into()));
        }
        if !self.kind.accepts(self.amount) {
            return Err(Error::Validation(format!(
                "{} amount must be {}, got {}",
                self.kind.as_str(),
                match self.kind {
                    TransactionKind::Income => "positive",
                    TransactionKind::Expense => "negative",
                },
                self.amount
            )));
        }
        Ok(())
    }
}

/// A budget to create or update (category names are unique per user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    #[serde(alias = "category")]
    pub name: String,
    #[serde(alias = "budget_amount")]
    pub budget: Decimal,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewBudget {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("budget category must not be empty".into()));
        }
        if self.budget < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "budget for '{}' must be non-negative, got {}",
                self.name, self.budget
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_converts_from_strings() {
        let borrowed: UserId = "alice".into();
        let owned = UserId::from(String::from("alice"));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.as_str(), "alice");
        assert_eq!(owned.to_string(), "alice");
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tx(id: i64, amount: i64, category: &str) -> Transaction {
        Transaction {
            id,
            date: date("2025-01-15"),
            description: None,
            amount: Decimal::from(amount),
            category: category.into(),
            kind: if amount > 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            },
            payment_mode: None,
            status: None,
        }
    }

    fn budget(name: &str, amount: i64) -> BudgetCategory {
        BudgetCategory {
            id: 1,
            name: name.into(),
            budget: Decimal::from(amount),
            spent: Decimal::from(999),
            color: None,
            icon: None,
        }
    }

    #[test]
    fn spent_is_recomputed_from_expenses() {
        let records = UserRecords::from_parts(
            vec![tx(1, -3000, "Food"), tx(2, -500, "Food"), tx(3, -1200, "Rent")],
            vec![budget("Food", 5000)],
        );
        assert_eq!(records.budgets[0].spent, Decimal::from(3500));
    }

    #[test]
    fn spent_ignores_income_in_same_category() {
        let records =
            UserRecords::from_parts(vec![tx(1, 200, "Food"), tx(2, -50, "Food")], vec![budget("Food", 100)]);
        assert_eq!(records.budgets[0].spent, Decimal::from(50));
    }

    #[test]
    fn every_income_transaction_becomes_an_income_source() {
        let records = UserRecords::from_parts(
            vec![tx(1, 50000, "Salary"), tx(2, -12000, "Rent"), tx(3, 800, "Freelance")],
            vec![],
        );
        assert_eq!(records.income.len(), 2);
        let salary = &records.income[0];
        assert_eq!(salary.id, 1);
        assert_eq!(salary.name, "Salary");
        assert_eq!(salary.amount, Decimal::from(50000));
        assert_eq!(salary.date, date("2025-01-15"));
        assert_eq!(records.income[1].name, "Freelance");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Income".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!(" expense ".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn income_constructor_names_the_credit() {
        let new = NewTransaction::income("Salary", Decimal::from(50000), date("2025-01-01"));
        assert_eq!(new.kind, TransactionKind::Income);
        assert_eq!(new.category, "Salary");
        assert_eq!(new.description.as_deref(), Some("Salary Credit"));
        assert!(new.validate().is_ok());
    }

    #[test]
    fn sign_mismatch_is_rejected() {
        let mut new = NewTransaction::income("Salary", Decimal::from(-5), date("2025-01-01"));
        assert!(matches!(new.validate(), Err(Error::Validation(_))));

        new.kind = TransactionKind::Expense;
        assert!(new.validate().is_ok());

        new.amount = Decimal::ZERO;
        assert!(new.validate().is_err());
    }

    #[test]
    fn negative_budget_is_rejected() {
        let new = NewBudget {
            name: "Food".into(),
            budget: Decimal::from(-1),
            color: None,
            icon: None,
        };
        assert!(new.validate().is_err());
    }

    #[test]
    fn new_transaction_accepts_store_field_names() {
        let new: NewTransaction = serde_json::from_str(
            r#"{"transaction_type":"expense","amount":-12.5,"category":"Food","transaction_date":"2025-02-01"}"#,
        )
        .unwrap();
        assert_eq!(new.kind, TransactionKind::Expense);
        assert_eq!(new.amount, Decimal::new(-125, 1));
        assert_eq!(new.date, date("2025-02-01"));
    }
}
