//! Spending analysis — a one-shot advisor report over per-category totals.
//!
//! Unlike a chat turn there is no question and no history. The prompt holds
//! the net total of each category and a fixed list of things to cover.

use finpilot_core::error::AssistantError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{Level, error, info};

use crate::aggregation::CategoryTotal;
use crate::gateway::AssistantReply;
use crate::relay::{UNAVAILABLE_REPLY, failure_level};

/// Returned without calling the provider when the user has no transactions.
pub const NO_DATA_ANALYSIS: &str = "No transaction data found for analysis.";

/// The advisor report for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingAnalysis {
    pub analysis: String,
    /// The category totals the report was built from.
    pub categories: Vec<CategoryTotal>,
    /// True when `analysis` is a substitute for a failed assistant call.
    pub degraded: bool,
}

impl SpendingAnalysis {
    pub fn no_data() -> Self {
        Self {
            analysis: NO_DATA_ANALYSIS.to_string(),
            categories: Vec::new(),
            degraded: false,
        }
    }

    /// Fold the provider outcome into a report. Never fails.
    pub fn from_outcome(
        outcome: Result<AssistantReply, AssistantError>,
        categories: Vec<CategoryTotal>,
    ) -> Self {
        let (analysis, degraded) = match outcome {
            Ok(reply) => (reply.text, false),
            Err(e) => {
                if failure_level(&e) == Level::INFO {
                    info!("Spending analysis cancelled by caller");
                } else {
                    error!(error = %e, "Spending analysis failed, sending fallback reply");
                }
                (UNAVAILABLE_REPLY.to_string(), true)
            }
        };

        Self {
            analysis,
            categories,
            degraded,
        }
    }
}

/// Build the advisor prompt from at most `max_categories` totals.
pub fn analysis_prompt(categories: &[CategoryTotal], max_categories: usize) -> String {
    let mut prompt = String::from(
        "As a financial advisor, analyze the following transaction data and provide insights.\n\n\
         Net total per category (negative means money spent):\n",
    );
    for c in categories.iter().take(max_categories) {
        prompt.push_str(&format!("- {}: {}\n", c.category, net_total(c)));
    }
    if categories.len() > max_categories {
        prompt.push_str(&format!(
            "({} more categories not listed)\n",
            categories.len() - max_categories
        ));
    }
    prompt.push_str(
        "\nPlease provide:\n\
         1. Spending pattern analysis\n\
         2. Top spending categories\n\
         3. Budget recommendations\n\
         4. Potential savings opportunities\n\n\
         Keep the response concise and actionable.",
    );
    prompt
}

fn net_total(total: &CategoryTotal) -> Decimal {
    total.income - total.spent
}
