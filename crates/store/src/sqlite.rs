//! SQLite record store.
//!
//! Two tables, both scoped by `user_id`:
//! - `transactions` — signed amounts, `transaction_type` of `income`/`expense`
//! - `budgets` — one row per (user, category)
//!
//! Money columns are `TEXT` holding the decimal's canonical string, so
//! amounts round-trip exactly. Rows that break the sign/kind rule or carry
//! an unparseable amount or date are reported as
//! [`DataAccessError::MalformedRecord`] instead of being passed on.

use async_trait::async_trait;
use chrono::NaiveDate;
use finpilot_core::error::DataAccessError;
use finpilot_core::records::{
    BudgetCategory, NewBudget, NewTransaction, Transaction, TransactionKind, UserId,
};
use finpilot_core::store::RecordStore;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A SQLite-backed record store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `":memory:"` for an ephemeral database.
    pub async fn open(path: &str) -> Result<Self, DataAccessError> {
        let in_memory = path == ":memory:" || path == "sqlite::memory:";

        let (options, max_connections) = if in_memory {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DataAccessError::Storage(format!("Invalid SQLite path: {e}")))?;
            // Every pooled connection to :memory: would otherwise see its own database.
            (options, 1)
        } else {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DataAccessError::Storage(format!("Cannot create {}: {e}", parent.display()))
                })?;
            }
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            (options, 4)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DataAccessError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite record store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DataAccessError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), DataAccessError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                amount           TEXT NOT NULL,
                category         TEXT NOT NULL,
                description      TEXT,
                transaction_date TEXT NOT NULL,
                payment_mode     TEXT,
                status           TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DataAccessError::MigrationFailed(format!("transactions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS budgets (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id       TEXT NOT NULL,
                category      TEXT NOT NULL,
                budget_amount TEXT NOT NULL,
                color         TEXT,
                icon          TEXT,
                UNIQUE(user_id, category)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DataAccessError::MigrationFailed(format!("budgets table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, transaction_date DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DataAccessError::MigrationFailed(format!("transactions index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction, DataAccessError> {
        let id: i64 = column(row, "id")?;
        let kind_raw: String = column(row, "transaction_type")?;
        let amount_raw: String = column(row, "amount")?;
        let date_raw: String = column(row, "transaction_date")?;

        let malformed = |reason: String| DataAccessError::MalformedRecord {
            table: "transactions",
            id,
            reason,
        };

        let kind = TransactionKind::from_str(&kind_raw).map_err(malformed)?;
        let amount = decimal_from_column(&amount_raw).map_err(malformed)?;
        if !kind.accepts(amount) {
            return Err(malformed(format!(
                "amount {amount} has the wrong sign for {}",
                kind.as_str()
            )));
        }
        let date = NaiveDate::parse_from_str(date_raw.trim(), DATE_FORMAT)
            .map_err(|e| malformed(format!("transaction_date '{date_raw}': {e}")))?;

        Ok(Transaction {
            id,
            date,
            description: column(row, "description")?,
            amount,
            category: column(row, "category")?,
            kind,
            payment_mode: column(row, "payment_mode")?,
            status: column(row, "status")?,
        })
    }

    fn row_to_budget(row: &sqlx::sqlite::SqliteRow) -> Result<BudgetCategory, DataAccessError> {
        let id: i64 = column(row, "id")?;
        let budget_raw: String = column(row, "budget_amount")?;
        let budget = decimal_from_column(&budget_raw).map_err(|reason| {
            DataAccessError::MalformedRecord {
                table: "budgets",
                id,
                reason,
            }
        })?;

        Ok(BudgetCategory {
            id,
            name: column(row, "category")?,
            budget,
            spent: Decimal::ZERO,
            color: column(row, "color")?,
            icon: column(row, "icon")?,
        })
    }
}

fn column<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, DataAccessError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| DataAccessError::QueryFailed(format!("{name} column: {e}")))
}

fn decimal_from_column(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("amount '{value}': {e}"))
}

async fn insert_transaction<'e, E>(
    executor: E,
    user: &UserId,
    tx: NewTransaction,
) -> Result<i64, DataAccessError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (user_id, transaction_type, amount, category, description,
             transaction_date, payment_mode, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(user.as_str())
    .bind(tx.kind.as_str())
    .bind(tx.amount.to_string())
    .bind(&tx.category)
    .bind(&tx.description)
    .bind(tx.date.format(DATE_FORMAT).to_string())
    .bind(&tx.payment_mode)
    .bind(&tx.status)
    .execute(executor)
    .await
    .map_err(|e| DataAccessError::Storage(format!("insert transaction: {e}")))?;

    Ok(result.last_insert_rowid())
}

async fn upsert_budget_row<'e, E>(
    executor: E,
    user: &UserId,
    budget: NewBudget,
) -> Result<i64, DataAccessError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO budgets (user_id, category, budget_amount, color, icon)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id, category) DO UPDATE SET
            budget_amount = excluded.budget_amount,
            color = COALESCE(excluded.color, budgets.color),
            icon = COALESCE(excluded.icon, budgets.icon)
        RETURNING id
        "#,
    )
    .bind(user.as_str())
    .bind(&budget.name)
    .bind(budget.budget.to_string())
    .bind(&budget.color)
    .bind(&budget.icon)
    .fetch_one(executor)
    .await
    .map_err(|e| DataAccessError::Storage(format!("upsert budget '{}': {e}", budget.name)))
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>, DataAccessError> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_type, amount, category, description,
                   transaction_date, payment_mode, status
            FROM transactions
            WHERE user_id = ?1
            ORDER BY transaction_date DESC, id DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataAccessError::QueryFailed(format!("transactions: {e}")))?;

        debug!(user = %user, rows = rows.len(), "Loaded transactions");
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn budget_categories(
        &self,
        user: &UserId,
    ) -> Result<Vec<BudgetCategory>, DataAccessError> {
        let rows = sqlx::query(
            r#"
            SELECT id, category, budget_amount, color, icon
            FROM budgets
            WHERE user_id = ?1
            ORDER BY category ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataAccessError::QueryFailed(format!("budgets: {e}")))?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    async fn add_transaction(
        &self,
        user: &UserId,
        tx: NewTransaction,
    ) -> Result<i64, DataAccessError> {
        insert_transaction(&self.pool, user, tx).await
    }

    async fn upsert_budget(&self, user: &UserId, budget: NewBudget) -> Result<i64, DataAccessError> {
        upsert_budget_row(&self.pool, user, budget).await
    }

    async fn write_batch(
        &self,
        user: &UserId,
        budgets: Vec<NewBudget>,
        transactions: Vec<NewTransaction>,
    ) -> Result<(), DataAccessError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DataAccessError::Storage(format!("begin batch: {e}")))?;

        for budget in budgets {
            upsert_budget_row(&mut *db_tx, user, budget).await?;
        }
        for tx in transactions {
            insert_transaction(&mut *db_tx, user, tx).await?;
        }

        // Dropping `db_tx` on an early return above rolls everything back.
        db_tx
            .commit()
            .await
            .map_err(|e| DataAccessError::Storage(format!("commit batch: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn expense(amount: i64, category: &str, on: &str) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Expense,
            amount: Decimal::from(amount),
            category: category.into(),
            description: None,
            date: date(on),
            payment_mode: Some("UPI".into()),
            status: None,
        }
    }

    fn budget(name: &str, amount: i64) -> NewBudget {
        NewBudget {
            name: name.into(),
            budget: Decimal::from(amount),
            color: None,
            icon: None,
        }
    }

    async fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finpilot.db");
        let store = SqliteStore::open(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn transactions_come_back_newest_first() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");

        let first = store
            .add_transaction(&user, expense(-100, "Food", "2025-01-10"))
            .await
            .unwrap();
        let second = store
            .add_transaction(&user, expense(-200, "Food", "2025-01-10"))
            .await
            .unwrap();
        let newest = store
            .add_transaction(&user, expense(-50, "Fuel", "2025-02-01"))
            .await
            .unwrap();

        let txs = store.transactions(&user).await.unwrap();
        let ids: Vec<i64> = txs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![newest, second, first]);
        assert_eq!(txs[0].payment_mode.as_deref(), Some("UPI"));
        assert_eq!(txs[0].date, date("2025-02-01"));
    }

    #[tokio::test]
    async fn reads_are_scoped_to_user() {
        let (store, _dir) = test_store().await;
        store
            .add_transaction(&UserId::from("alice"), expense(-100, "Food", "2025-01-10"))
            .await
            .unwrap();
        store
            .upsert_budget(&UserId::from("alice"), budget("Food", 500))
            .await
            .unwrap();

        let bob = UserId::from("bob");
        assert!(store.transactions(&bob).await.unwrap().is_empty());
        assert!(store.budget_categories(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fractional_amounts_survive_storage() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");
        let mut tx = expense(0, "Coffee", "2025-03-01");
        tx.amount = Decimal::new(-1250, 2);
        store.add_transaction(&user, tx).await.unwrap();

        let txs = store.transactions(&user).await.unwrap();
        assert_eq!(txs[0].amount, Decimal::new(-125, 1));
    }

    #[tokio::test]
    async fn upsert_updates_existing_category() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");

        let id1 = store.upsert_budget(&user, budget("Food", 5000)).await.unwrap();
        let id2 = store.upsert_budget(&user, budget("Food", 6000)).await.unwrap();
        assert_eq!(id1, id2);

        let budgets = store.budget_categories(&user).await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].budget, Decimal::from(6000));
    }

    #[tokio::test]
    async fn load_recomputes_spent_and_income() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");
        store
            .add_transaction(
                &user,
                NewTransaction::income("Salary", Decimal::from(50000), date("2025-01-01")),
            )
            .await
            .unwrap();
        store
            .add_transaction(&user, expense(-3000, "Food", "2025-01-05"))
            .await
            .unwrap();
        store.upsert_budget(&user, budget("Food", 5000)).await.unwrap();

        let records = store.load(&user).await.unwrap();
        assert_eq!(records.transactions.len(), 2);
        assert_eq!(records.budgets[0].spent, Decimal::from(3000));
        assert_eq!(records.income.len(), 1);
        assert_eq!(records.income[0].name, "Salary");
    }

    #[tokio::test]
    async fn sign_mismatch_is_malformed() {
        let (store, _dir) = test_store().await;
        sqlx::query(
            "INSERT INTO transactions (user_id, transaction_type, amount, category, transaction_date)
             VALUES ('alice', 'income', -10.0, 'Refund', '2025-01-01')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.transactions(&UserId::from("alice")).await.unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::MalformedRecord {
                table: "transactions",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bad_date_is_malformed() {
        let (store, _dir) = test_store().await;
        sqlx::query(
            "INSERT INTO transactions (user_id, transaction_type, amount, category, transaction_date)
             VALUES ('alice', 'expense', -10.0, 'Food', 'yesterday')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        assert!(store.transactions(&UserId::from("alice")).await.is_err());
    }

    #[tokio::test]
    async fn in_memory_database_keeps_state() {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let user = UserId::from("alice");
        store
            .add_transaction(&user, expense(-1, "Food", "2025-01-01"))
            .await
            .unwrap();
        assert_eq!(store.transactions(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn amounts_round_trip_exactly() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");
        let exact = [
            Decimal::from_str("-1234567890123456.78").unwrap(),
            Decimal::from_str("-333333333.3333333333").unwrap(),
            Decimal::from_str("-0.01").unwrap(),
        ];
        for (i, amount) in exact.iter().enumerate() {
            let mut tx = expense(0, "Misc", "2025-01-01");
            tx.amount = *amount;
            tx.date = date("2025-01-01") + chrono::Days::new(i as u64);
            store.add_transaction(&user, tx).await.unwrap();
        }
        let mut big = budget("Misc", 0);
        big.budget = Decimal::from_str("98765432109876543.21").unwrap();
        store.upsert_budget(&user, big).await.unwrap();

        let txs = store.transactions(&user).await.unwrap();
        let stored: Vec<Decimal> = txs.iter().rev().map(|t| t.amount).collect();
        assert_eq!(stored, exact);
        assert_eq!(txs[2].amount.to_string(), "-1234567890123456.78");

        let budgets = store.budget_categories(&user).await.unwrap();
        assert_eq!(budgets[0].budget.to_string(), "98765432109876543.21");
    }

    #[tokio::test]
    async fn unparseable_amount_is_malformed() {
        let (store, _dir) = test_store().await;
        sqlx::query(
            "INSERT INTO transactions (user_id, transaction_type, amount, category, transaction_date)
             VALUES ('alice', 'expense', 'ten', 'Food', '2025-01-01')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.transactions(&UserId::from("alice")).await.unwrap_err();
        assert!(matches!(err, DataAccessError::MalformedRecord { .. }));
    }

    #[tokio::test]
    async fn write_batch_commits_every_row() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");

        store
            .write_batch(
                &user,
                vec![budget("Food", 5000), budget("Fuel", 800)],
                vec![
                    expense(-3000, "Food", "2025-01-05"),
                    expense(-200, "Fuel", "2025-01-06"),
                ],
            )
            .await
            .unwrap();

        let records = store.load(&user).await.unwrap();
        assert_eq!(records.transactions.len(), 2);
        assert_eq!(records.budgets.len(), 2);
        assert_eq!(records.budgets[0].spent, Decimal::from(3000));
    }

    #[tokio::test]
    async fn failed_batch_writes_nothing() {
        let (store, _dir) = test_store().await;
        let user = UserId::from("alice");
        // The budget upsert succeeds; the transaction insert then fails.
        sqlx::query("DROP TABLE transactions")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store
            .write_batch(
                &user,
                vec![budget("Food", 5000)],
                vec![expense(-3000, "Food", "2025-01-05")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::Storage(_)));
        assert!(store.budget_categories(&user).await.unwrap().is_empty());
    }
}
