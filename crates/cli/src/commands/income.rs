//! `finpilot income` — Income sources, derived from income transactions.

use finpilot_core::records::UserId;
use finpilot_core::store::RecordStore;

pub async fn run(user: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    let user = UserId::from(user);
    let records = store
        .load(&user)
        .await
        .map_err(|e| format!("Could not load records for {user}: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records.income)?);
        return Ok(());
    }

    if records.income.is_empty() {
        println!("  No income recorded for {user}.");
        return Ok(());
    }

    println!();
    println!("  {:<12} {:<24} {:>14}", "Date", "Source", "Amount");
    for source in &records.income {
        println!(
            "  {:<12} {:<24} {:>14}",
            source.date.format("%Y-%m-%d").to_string(),
            source.name,
            source.amount
        );
    }
    println!();
    Ok(())
}
