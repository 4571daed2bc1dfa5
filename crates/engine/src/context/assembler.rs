//! Prompt assembly — turns a user's records and question into one bounded prompt.
//!
//! The prompt is built from fixed sections, in this order:
//!
//! 1. **Instructions** (persona, response protocol) — never trimmed
//! 2. **Conversation so far** (replayed turns) — oldest turns dropped
//! 3. **Data overview** (counts, category labels) — labels capped
//! 4. **Financial snapshot** (KPIs, records as JSON) — oldest transactions dropped
//! 5. **Question** — always last, verbatim
//!
//! # Determinism
//!
//! Transactions are ordered by date descending, then id descending, and the
//! first `max_transactions` are embedded. Identical inputs always produce
//! identical prompts.

use std::collections::{BTreeSet, HashSet};

use finpilot_core::error::Result;
use finpilot_core::message::AssistantMessage;
use finpilot_core::records::{IncomeSource, Transaction, UserRecords};
use serde::{Deserialize, Serialize};

use crate::aggregation::{self, BudgetStatus, CategoryTotal, FinancialSnapshot};
use crate::context::token;

const INSTRUCTIONS: &str = "\
You are FinPilot, an AI financial assistant specializing in personal finance analysis. \
Your task is to help users analyze their spending patterns and provide actionable financial advice.

When a user asks about spending by category and time period, follow this protocol:

1. CLARIFY: if the question does not say which period or category it is about, ask for
   - the start date of the period (YYYY-MM-DD)
   - the end date of the period (YYYY-MM-DD)
   - the category to analyze
2. ANALYZE the financial data provided below:
   - filter transactions by the requested date range and category
   - total the amount spent in that category over the period
   - compare it against the budget, if one exists
   - point out spending patterns and trends
3. SUMMARIZE with:
   - the total amount spent
   - the budget comparison, if applicable
   - practical suggestions for managing the budget
   - tips for adjusting spending habits

Amounts are signed: positive values are income, negative values are expenses.";

const CLOSING: &str = "\
Give helpful, actionable advice grounded in the user's actual financial data. \
When you need a date range or category, ask for it conversationally.";

// ── Types ─────────────────────────────────────────────────────────────────

/// How much raw data one prompt may embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Most recent transactions embedded verbatim.
    pub max_transactions: usize,
    /// Category labels, breakdown rows and budget rows listed.
    pub max_categories: usize,
    /// Replayed chat messages (newest kept).
    pub max_history_messages: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_transactions: 500,
            max_categories: 50,
            max_history_messages: 10,
        }
    }
}

impl From<&finpilot_config::ContextConfig> for ContextLimits {
    fn from(config: &finpilot_config::ContextConfig) -> Self {
        Self {
            max_transactions: config.max_transactions,
            max_categories: config.max_categories,
            max_history_messages: config.max_history_messages,
        }
    }
}

/// All inputs for one chat turn.
pub struct AssemblyInput<'a> {
    /// The user's records, in any order.
    pub records: &'a UserRecords,
    /// Prior turns the caller chose to replay, oldest first.
    pub history: &'a [AssistantMessage],
    /// The current question.
    pub question: &'a str,
}

/// The assembled prompt, ready for the assistant gateway.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub prompt: String,
    pub metadata: PromptMetadata,
}

/// Facts about the assembled prompt, available even if the provider call fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptMetadata {
    /// Every transaction the user has, embedded or not.
    pub transaction_count: usize,
    /// Every distinct category label, sorted.
    pub categories: Vec<String>,
    pub embedded_transactions: usize,
    pub omitted_transactions: usize,
    pub budget_category_count: usize,
    /// Heuristic size of the whole prompt.
    pub estimated_tokens: usize,
    pub sections: Vec<SectionStats>,
    pub drops: Vec<DropInfo>,
}

/// Statistics for one prompt section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    pub tokens: usize,
    pub items_included: usize,
    pub items_total: usize,
}

/// Items left out of a section by a limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    pub section: String,
    pub items_dropped: usize,
    pub reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptSnapshot<'a> {
    summary: &'a FinancialSnapshot,
    transactions: &'a [&'a Transaction],
    budget_categories: &'a [BudgetStatus],
    income_data: &'a [&'a IncomeSource],
    category_breakdown: &'a [CategoryTotal],
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The prompt assembler. Stateless; create one and reuse it.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    limits: ContextLimits,
}

impl ContextAssembler {
    pub fn new(limits: ContextLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ContextLimits {
        self.limits
    }

    /// Build the prompt and its metadata.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> Result<AssembledPrompt> {
        let records = input.records;
        let mut sections: Vec<String> = Vec::new();
        let mut stats: Vec<SectionStats> = Vec::new();
        let mut drops: Vec<DropInfo> = Vec::new();

        // ── Instructions ───────────────────────────────────────────────────
        sections.push(INSTRUCTIONS.to_string());
        stats.push(single_section("instructions", INSTRUCTIONS));

        // ── Conversation so far ────────────────────────────────────────────
        let (history, history_stats, history_drop) =
            Self::render_history(input.history, self.limits.max_history_messages);
        if !history.is_empty() {
            sections.push(history);
        }
        stats.push(history_stats);
        drops.extend(history_drop);

        // ── Records ────────────────────────────────────────────────────────
        let mut ordered: Vec<&Transaction> = records.transactions.iter().collect();
        ordered.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        let total = ordered.len();
        let embedded: Vec<&Transaction> =
            ordered.into_iter().take(self.limits.max_transactions).collect();
        let omitted = total - embedded.len();
        if omitted > 0 {
            drops.push(DropInfo {
                section: "transactions".into(),
                items_dropped: omitted,
                reason: format!(
                    "only the {} most recent transactions are embedded",
                    self.limits.max_transactions
                ),
            });
        }

        let embedded_ids: HashSet<i64> = embedded.iter().map(|t| t.id).collect();
        let income: Vec<&IncomeSource> = records
            .income
            .iter()
            .filter(|i| embedded_ids.contains(&i.id))
            .collect();

        let categories: BTreeSet<&str> = records
            .transactions
            .iter()
            .map(|t| t.category.as_str())
            .collect();

        let mut breakdown = aggregation::category_breakdown(&records.transactions);
        let breakdown_total = breakdown.len();
        breakdown.truncate(self.limits.max_categories);
        if breakdown_total > breakdown.len() {
            drops.push(DropInfo {
                section: "categories".into(),
                items_dropped: breakdown_total - breakdown.len(),
                reason: format!(
                    "only the {} largest categories are listed",
                    self.limits.max_categories
                ),
            });
        }

        let mut budgets = aggregation::budget_status(&records.budgets);
        let budgets_total = budgets.len();
        budgets.truncate(self.limits.max_categories);
        if budgets_total > budgets.len() {
            drops.push(DropInfo {
                section: "budgets".into(),
                items_dropped: budgets_total - budgets.len(),
                reason: format!("only {} budget categories are listed", self.limits.max_categories),
            });
        }

        // ── Data overview ──────────────────────────────────────────────────
        let listed_labels: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        let mut overview = format!(
            "Available financial data for analysis:\n\
             - Total transactions: {total}\n\
             - Budget categories: {budgets_total}\n\
             - Transaction categories: {}",
            listed_labels.join(", ")
        );
        if omitted > 0 {
            overview.push_str(&format!(
                "\n- Transactions included below: the {} most recent of {total} (newest first); \
                 the summary and category totals cover all of them",
                embedded.len()
            ));
        }
        stats.push(SectionStats {
            name: "overview".into(),
            tokens: token::estimate_tokens(&overview),
            items_included: listed_labels.len(),
            items_total: categories.len(),
        });
        sections.push(overview);

        // ── Financial snapshot ─────────────────────────────────────────────
        let summary = aggregation::aggregate(&records.transactions, &records.budgets);
        let snapshot = PromptSnapshot {
            summary: &summary,
            transactions: &embedded,
            budget_categories: &budgets,
            income_data: &income,
            category_breakdown: &breakdown,
        };
        let snapshot_json = serde_json::to_string_pretty(&snapshot)?;
        let snapshot_section = format!("Current financial snapshot:\n{snapshot_json}");
        stats.push(SectionStats {
            name: "snapshot".into(),
            tokens: token::estimate_tokens(&snapshot_section),
            items_included: embedded.len(),
            items_total: total,
        });
        sections.push(snapshot_section);

        sections.push(CLOSING.to_string());

        // ── Question ───────────────────────────────────────────────────────
        let question = format!("User: {}", input.question);
        stats.push(single_section("question", &question));
        sections.push(question);

        let prompt = sections.join("\n\n");

        Ok(AssembledPrompt {
            metadata: PromptMetadata {
                transaction_count: total,
                categories: categories.into_iter().map(String::from).collect(),
                embedded_transactions: embedded.len(),
                omitted_transactions: omitted,
                budget_category_count: budgets_total,
                estimated_tokens: token::estimate_tokens(&prompt),
                sections: stats,
                drops,
            },
            prompt,
        })
    }

    /// Render the newest `max` turns, oldest first.
    fn render_history(
        history: &[AssistantMessage],
        max: usize,
    ) -> (String, SectionStats, Option<DropInfo>) {
        let skip = history.len().saturating_sub(max);
        let kept = &history[skip..];

        let stats = SectionStats {
            name: "history".into(),
            tokens: kept.iter().map(token::estimate_message_tokens).sum(),
            items_included: kept.len(),
            items_total: history.len(),
        };
        let drop = (skip > 0).then(|| DropInfo {
            section: "history".into(),
            items_dropped: skip,
            reason: "oldest turns dropped".into(),
        });

        if kept.is_empty() {
            return (String::new(), stats, drop);
        }

        let lines: Vec<String> = kept
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect();
        (
            format!("Conversation so far:\n{}", lines.join("\n")),
            stats,
            drop,
        )
    }
}

fn single_section(name: &str, text: &str) -> SectionStats {
    SectionStats {
        name: name.into(),
        tokens: token::estimate_tokens(text),
        items_included: 1,
        items_total: 1,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
