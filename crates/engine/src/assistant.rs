//! The finance assistant pipeline.
//!
//! ```text
//! RecordStore ──► aggregate ──► Dashboard
//!      │
//!      └──► ContextAssembler ──► AssistantGateway ──► ResponseRelay ──► ChatReply
//! ```
//!
//! Each call is independent: records are read fresh, nothing is cached and
//! chat history lives with the caller.

use std::sync::Arc;

use finpilot_config::AppConfig;
use finpilot_core::error::{Error, Result};
use finpilot_core::message::AssistantMessage;
use finpilot_core::records::{IncomeSource, UserId};
use finpilot_core::store::RecordStore;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregation::{self, BudgetStatus, CategoryTotal, FinancialSnapshot};
use crate::analysis::{self, SpendingAnalysis};
use crate::context::{AssemblyInput, ContextAssembler, ContextLimits};
use crate::gateway::{AssistantGateway, GenerationParams};
use crate::relay::{ChatReply, ResponseRelay};

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub snapshot: FinancialSnapshot,
    pub budgets: Vec<BudgetStatus>,
    pub income: Vec<IncomeSource>,
    pub categories: Vec<CategoryTotal>,
}

/// One chat turn as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: UserId,
    pub question: String,
    /// Prior turns to replay, oldest first.
    #[serde(default)]
    pub history: Vec<AssistantMessage>,
    /// Echoed back in the reply; generated when absent.
    #[serde(default)]
    pub turn_id: Option<String>,
}

impl ChatRequest {
    pub fn new(user_id: UserId, question: impl Into<String>) -> Self {
        Self {
            user_id,
            question: question.into(),
            history: Vec::new(),
            turn_id: None,
        }
    }

    pub fn with_history(mut self, history: Vec<AssistantMessage>) -> Self {
        self.history = history;
        self
    }
}

pub struct FinanceAssistant {
    store: Arc<dyn RecordStore>,
    assembler: ContextAssembler,
    gateway: std::result::Result<AssistantGateway, String>,
}

impl FinanceAssistant {
    pub fn new(store: Arc<dyn RecordStore>, gateway: AssistantGateway) -> Self {
        Self {
            store,
            assembler: ContextAssembler::default(),
            gateway: Ok(gateway),
        }
    }

    /// An assistant that serves dashboards but fails every chat turn with
    /// a configuration error carrying `reason`.
    pub fn without_gateway(store: Arc<dyn RecordStore>, reason: impl Into<String>) -> Self {
        Self {
            store,
            assembler: ContextAssembler::default(),
            gateway: Err(reason.into()),
        }
    }

    /// Build from configuration. A missing provider credential does not fail
    /// construction; it fails each chat turn instead.
    pub fn from_config(config: &AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let limits = ContextLimits::from(&config.context);
        let assistant = match finpilot_providers::build_from_config(config) {
            Ok(resolved) => Self::new(
                store,
                AssistantGateway::new(resolved.provider, resolved.model)
                    .with_params(GenerationParams::from_config(config)),
            ),
            Err(Error::Config { message }) => {
                warn!(%message, "Assistant disabled");
                Self::without_gateway(store, message)
            }
            Err(other) => Self::without_gateway(store, other.to_string()),
        };
        assistant.with_limits(limits)
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.assembler = ContextAssembler::new(limits);
        self
    }

    /// Whether chat turns can reach a provider.
    pub fn assistant_available(&self) -> bool {
        self.gateway.is_ok()
    }

    /// Why chat turns are disabled, if they are.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.gateway.as_ref().err().map(String::as_str)
    }

    /// Load records and compute the dashboard. Store failures propagate.
    pub async fn dashboard(&self, user: &UserId) -> Result<Dashboard> {
        let records = self.store.load(user).await?;
        debug!(user = %user, transactions = records.transactions.len(), "Computing dashboard");

        Ok(Dashboard {
            snapshot: aggregation::aggregate(&records.transactions, &records.budgets),
            budgets: aggregation::budget_status(&records.budgets),
            categories: aggregation::category_breakdown(&records.transactions),
            income: records.income,
        })
    }

    /// Ask for an advisor report over the user's category totals.
    ///
    /// With no transactions the report is [`analysis::NO_DATA_ANALYSIS`]
    /// and no provider is needed. Otherwise a missing provider is a
    /// configuration error and a failed call is a degraded report.
    pub async fn analyze_spending(&self, user: &UserId) -> Result<SpendingAnalysis> {
        let records = self.store.load(user).await?;
        if records.transactions.is_empty() {
            debug!(user = %user, "No transactions to analyze");
            return Ok(SpendingAnalysis::no_data());
        }

        let gateway = self.gateway.as_ref().map_err(|reason| Error::config(reason.clone()))?;

        let categories = aggregation::category_breakdown(&records.transactions);
        let prompt = analysis::analysis_prompt(&categories, self.assembler.limits().max_categories);

        info!(
            user = %user,
            transactions = records.transactions.len(),
            categories = categories.len(),
            "Spending analysis requested"
        );

        let outcome = gateway.ask(&prompt).await;
        Ok(SpendingAnalysis::from_outcome(outcome, categories))
    }

    /// Run one chat turn.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        // Held until the turn ends and never flipped.
        let (_never, cancel) = watch::channel(false);
        self.chat_with_cancel(request, cancel).await
    }

    /// Run one chat turn that the caller may abandon through `cancel`.
    ///
    /// Configuration and store failures are returned as errors. Assistant
    /// failures, including cancellation, come back as a degraded reply.
    pub async fn chat_with_cancel(
        &self,
        request: ChatRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<ChatReply> {
        if request.question.trim().is_empty() {
            return Err(Error::Validation("question must not be empty".into()));
        }

        let gateway = self.gateway.as_ref().map_err(|reason| Error::config(reason.clone()))?;

        let records = self.store.load(&request.user_id).await?;

        let assembled = self.assembler.assemble(&AssemblyInput {
            records: &records,
            history: &request.history,
            question: &request.question,
        })?;

        let turn_id = request
            .turn_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!(
            turn_id = %turn_id,
            user = %request.user_id,
            transactions = assembled.metadata.transaction_count,
            embedded = assembled.metadata.embedded_transactions,
            estimated_tokens = assembled.metadata.estimated_tokens,
            "Chat turn assembled"
        );

        let outcome = gateway.ask_with_cancel(&assembled.prompt, cancel).await;

        Ok(ResponseRelay::relay(
            turn_id,
            outcome,
            &assembled.metadata,
            &records.budgets,
        ))
    }
}
