//! `finpilot analyze` — One advisor report over a user's category totals.

use finpilot_core::records::UserId;
use finpilot_engine::{FinanceAssistant, SpendingAnalysis};

pub async fn run(user: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let assistant = FinanceAssistant::from_config(&config, store);

    let user = UserId::from(user);
    if !json {
        eprint!("  Analyzing...");
    }
    let report = assistant.analyze_spending(&user).await;
    if !json {
        eprint!("\r              \r");
    }
    let report = report.map_err(|e| format!("Could not analyze spending for {user}: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&user, &report);
    }
    Ok(())
}

fn print_report(user: &UserId, report: &SpendingAnalysis) {
    println!();
    println!("  📊 Spending analysis — {user}");
    println!("  ==============================");
    for c in report.categories.iter().take(5) {
        println!("    {:<18} spent {:>12}  income {:>12}", c.category, c.spent, c.income);
    }
    if !report.categories.is_empty() {
        println!();
    }
    for line in report.analysis.lines() {
        println!("  {line}");
    }
    if report.degraded {
        println!();
        println!("  (assistant unavailable, run `finpilot doctor` for details)");
    }
    println!();
}
