//! # FinPilot Engine
//!
//! The aggregation and assistant pipeline: KPIs from records, a bounded
//! prompt from records plus a question, one provider call, one reply.
//! A spending analysis runs the same path with a fixed advisor prompt.

pub mod aggregation;
pub mod analysis;
pub mod assistant;
pub mod context;
pub mod gateway;
pub mod import;
pub mod relay;

pub use aggregation::{BudgetStatus, CategoryTotal, FinancialSnapshot, aggregate};
pub use analysis::{NO_DATA_ANALYSIS, SpendingAnalysis};
pub use assistant::{ChatRequest, Dashboard, FinanceAssistant};
pub use context::{AssembledPrompt, AssemblyInput, ContextAssembler, ContextLimits, PromptMetadata};
pub use gateway::{AssistantGateway, AssistantReply, FALLBACK_REPLY, GenerationParams};
pub use import::{ImportBatch, ImportSummary, IncomeEntry};
pub use relay::{BudgetSummary, ChatReply, ResponseRelay, UNAVAILABLE_REPLY};
