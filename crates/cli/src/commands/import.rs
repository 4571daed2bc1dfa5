//! `finpilot import` — Load records from a JSON file.
//!
//! ```json
//! {
//!   "transactions": [{"transaction_type": "expense", "amount": -3000, "category": "Food", "date": "2025-01-04"}],
//!   "budgets": [{"category": "Food", "budget_amount": 5000}],
//!   "income": [{"name": "Salary", "amount": 50000, "date": "2025-01-01"}]
//! }
//! ```

use std::path::PathBuf;

use finpilot_core::records::UserId;
use finpilot_engine::ImportBatch;
use tracing::debug;

pub async fn run(user: String, file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| format!("Cannot read {}: {e}", file.display()))?;
    debug!(file = %file.display(), bytes = text.len(), "Read import file");
    let batch = ImportBatch::from_json(&text)
        .map_err(|e| format!("{} is not a valid import file: {e}", file.display()))?;

    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    let user = UserId::from(user);
    let summary = batch.apply(store.as_ref(), &user).await?;

    println!(
        "✅ Imported {} transactions, {} budgets and {} income records for {user}",
        summary.transactions, summary.budgets, summary.income
    );
    Ok(())
}
