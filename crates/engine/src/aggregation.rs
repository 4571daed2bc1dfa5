//! Aggregation engine — pure functions from records to KPIs.
//!
//! Nothing here touches I/O or holds state. The same inputs always produce
//! the same outputs, and input order never matters.

use std::collections::BTreeMap;

use finpilot_core::records::{BudgetCategory, Transaction};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Derived dashboard KPIs. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub total_income: Decimal,
    /// Always `total_income - total_spent`.
    pub current_balance: Decimal,
    pub budget_usage_percentage: i64,
    pub savings_percentage: i64,
}

/// Per-category totals, used by the dashboard and the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub spent: Decimal,
    pub income: Decimal,
    pub transaction_count: usize,
}

impl CategoryTotal {
    fn volume(&self) -> Decimal {
        self.spent + self.income
    }
}

/// One budget category with its usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
    /// Negative when the budget is overspent.
    pub remaining: Decimal,
    pub usage_percentage: i64,
}

/// Compute the dashboard snapshot.
///
/// `total_spent` sums the absolute value of every negative amount and
/// `total_income` every positive one, regardless of budget membership.
pub fn aggregate(transactions: &[Transaction], budgets: &[BudgetCategory]) -> FinancialSnapshot {
    let total_budget: Decimal = budgets.iter().map(|b| b.budget).sum();

    let (total_income, total_spent) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, spent), t| {
            if t.amount > Decimal::ZERO {
                (income + t.amount, spent)
            } else {
                (income, spent + t.amount.abs())
            }
        },
    );

    let current_balance = total_income - total_spent;

    FinancialSnapshot {
        total_budget,
        total_spent,
        total_income,
        current_balance,
        budget_usage_percentage: percentage(total_spent, total_budget),
        savings_percentage: percentage(current_balance, total_income),
    }
}

/// `round(100 * part / whole)` with round-half-up, or 0 when `whole` is 0.
///
/// Half-up means toward positive infinity: 12.5 -> 13, -12.5 -> -12.
/// Results beyond the `i64` range saturate.
pub fn percentage(part: Decimal, whole: Decimal) -> i64 {
    if whole.is_zero() {
        return 0;
    }
    let half = Decimal::new(5, 1);
    let rounded = part
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .and_then(|ratio| ratio.checked_add(half))
        .map(|r| r.floor());

    match rounded {
        Some(r) => r.to_i64().unwrap_or(if r.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        }),
        // Overflow only happens for astronomically large ratios.
        None => {
            if part.is_sign_negative() == whole.is_sign_negative() {
                i64::MAX
            } else {
                i64::MIN
            }
        }
    }
}

/// Totals per category, sorted by absolute volume (desc) then name.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut by_category: BTreeMap<&str, CategoryTotal> = BTreeMap::new();

    for t in transactions {
        let entry = by_category
            .entry(t.category.as_str())
            .or_insert_with(|| CategoryTotal {
                category: t.category.clone(),
                spent: Decimal::ZERO,
                income: Decimal::ZERO,
                transaction_count: 0,
            });
        if t.amount > Decimal::ZERO {
            entry.income += t.amount;
        } else {
            entry.spent += t.amount.abs();
        }
        entry.transaction_count += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category.into_values().collect();
    totals.sort_by(|a, b| {
        b.volume()
            .cmp(&a.volume())
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

/// Usage of each budget category. Expects `spent` already recomputed.
pub fn budget_status(budgets: &[BudgetCategory]) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|b| BudgetStatus {
            name: b.name.clone(),
            budget: b.budget,
            spent: b.spent,
            remaining: b.budget - b.spent,
            usage_percentage: percentage(b.spent, b.budget),
        })
        .collect()
}
