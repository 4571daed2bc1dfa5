//! Response relay — folds the assistant outcome and prompt metadata into one reply.
//!
//! The relay never fails. An assistant error is logged for operators and
//! replaced by an apology, so the caller always gets a reply bubble along
//! with the true record counts.

use finpilot_core::error::AssistantError;
use finpilot_core::records::BudgetCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{Level, error, info};

use crate::context::PromptMetadata;
use crate::gateway::AssistantReply;

/// Reply text shown when the assistant call failed.
pub const UNAVAILABLE_REPLY: &str =
    "Sorry, the assistant is unavailable right now. Please try again in a moment.";

/// What the caller receives for one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Matches the reply to its request when turns overlap.
    pub turn_id: String,
    pub reply_text: String,
    pub transactions_analyzed: usize,
    pub categories_available: Vec<String>,
    pub budget_categories: Vec<BudgetSummary>,
    /// True when `reply_text` is a substitute for a failed assistant call.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
}

impl From<&BudgetCategory> for BudgetSummary {
    fn from(b: &BudgetCategory) -> Self {
        Self {
            name: b.name.clone(),
            budget: b.budget,
            spent: b.spent,
        }
    }
}

pub struct ResponseRelay;

impl ResponseRelay {
    /// Build the reply for `turn_id`, recovering any assistant error.
    pub fn relay(
        turn_id: String,
        outcome: Result<AssistantReply, AssistantError>,
        metadata: &PromptMetadata,
        budgets: &[BudgetCategory],
    ) -> ChatReply {
        let (reply_text, degraded) = match outcome {
            Ok(reply) => (reply.text, false),
            Err(e) => {
                if failure_level(&e) == Level::INFO {
                    info!(turn_id = %turn_id, "Turn cancelled by caller");
                } else {
                    error!(turn_id = %turn_id, error = %e, "Assistant call failed, sending fallback reply");
                }
                (UNAVAILABLE_REPLY.to_string(), true)
            }
        };

        ChatReply {
            turn_id,
            reply_text,
            transactions_analyzed: metadata.transaction_count,
            categories_available: metadata.categories.clone(),
            budget_categories: budgets.iter().map(BudgetSummary::from).collect(),
            degraded,
        }
    }
}

/// Cancellation is logged at info, every other failure at error.
pub(crate) fn failure_level(error: &AssistantError) -> Level {
    match error {
        AssistantError::Cancelled => Level::INFO,
        _ => Level::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PromptMetadata {
        PromptMetadata {
            transaction_count: 3,
            categories: vec!["Food".into(), "Rent".into(), "Salary".into()],
            ..PromptMetadata::default()
        }
    }

    fn food_budget() -> BudgetCategory {
        BudgetCategory {
            id: 1,
            name: "Food".into(),
            budget: Decimal::from(5000),
            spent: Decimal::from(3000),
            color: Some("#f00".into()),
            icon: None,
        }
    }

    #[test]
    fn successful_reply_passes_through() {
        let reply = AssistantReply {
            text: "You spent 3000 on food.".into(),
            fallback: false,
            model: "m".into(),
            usage: None,
        };
        let out = ResponseRelay::relay("t1".into(), Ok(reply), &metadata(), &[food_budget()]);
        assert_eq!(out.reply_text, "You spent 3000 on food.");
        assert!(!out.degraded);
        assert_eq!(out.transactions_analyzed, 3);
        assert_eq!(out.budget_categories[0].spent, Decimal::from(3000));
    }

    #[test]
    fn errors_become_an_apology_with_true_counts() {
        let out = ResponseRelay::relay(
            "t2".into(),
            Err(AssistantError::Timeout("30s".into())),
            &metadata(),
            &[],
        );
        assert_eq!(out.reply_text, UNAVAILABLE_REPLY);
        assert!(out.degraded);
        assert_eq!(out.transactions_analyzed, 3);
        assert_eq!(out.categories_available.len(), 3);
        assert_eq!(out.turn_id, "t2");
    }

    #[test]
    fn serializes_camel_case() {
        let out = ResponseRelay::relay(
            "t3".into(),
            Err(AssistantError::Cancelled),
            &metadata(),
            &[food_budget()],
        );
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["turnId"], "t3");
        assert_eq!(json["transactionsAnalyzed"], 3);
        assert_eq!(json["categoriesAvailable"][0], "Food");
        assert_eq!(json["budgetCategories"][0]["name"], "Food");
        assert!(json.get("replyText").is_some());
    }

    #[test]
    fn cancellation_is_not_logged_as_an_error() {
        assert_eq!(failure_level(&AssistantError::Cancelled), Level::INFO);
        assert_eq!(
            failure_level(&AssistantError::Timeout("30s".into())),
            Level::ERROR
        );
        assert_eq!(
            failure_level(&AssistantError::ApiError {
                status_code: 500,
                message: "boom".into()
            }),
            Level::ERROR
        );
    }
}
