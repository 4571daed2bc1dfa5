//! `finpilot dashboard` — KPI tiles, budget usage and category totals.

use finpilot_core::records::UserId;
use finpilot_engine::{Dashboard, FinanceAssistant};

pub async fn run(user: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let assistant = FinanceAssistant::from_config(&config, store);

    let user = UserId::from(user);
    let dashboard = assistant
        .dashboard(&user)
        .await
        .map_err(|e| format!("Could not load records for {user}: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_dashboard(&user, &dashboard);
    }
    Ok(())
}

fn print_dashboard(user: &UserId, dashboard: &Dashboard) {
    let s = &dashboard.snapshot;

    println!();
    println!("  💰 FinPilot Dashboard — {user}");
    println!("  ==============================");
    println!("  Total income:     {:>14}", s.total_income);
    println!("  Total spent:      {:>14}", s.total_spent);
    println!("  Current balance:  {:>14}", s.current_balance);
    println!("  Total budget:     {:>14}", s.total_budget);
    println!("  Budget used:      {:>13}%", s.budget_usage_percentage);
    println!("  Savings:          {:>13}%", s.savings_percentage);

    if !dashboard.budgets.is_empty() {
        println!();
        println!("  Budgets");
        for b in &dashboard.budgets {
            println!(
                "    {:<18} {:>12} / {:<12} {:>4}%  (remaining {})",
                b.name, b.spent, b.budget, b.usage_percentage, b.remaining
            );
        }
    }

    if !dashboard.categories.is_empty() {
        println!();
        println!("  Categories");
        for c in &dashboard.categories {
            println!(
                "    {:<18} spent {:>12}  income {:>12}  ({} txn)",
                c.category, c.spent, c.income, c.transaction_count
            );
        }
    }
    println!();
}
