//! # FinPilot Core
//!
//! Domain types, traits, and error definitions for the FinPilot personal
//! finance assistant. This crate has **no I/O dependencies**: it defines the
//! records, the error taxonomy, and the two seams every other crate
//! implements against.
//!
//! ## Seams
//!
//! - [`RecordStore`] reads one user's transactions and budgets.
//! - [`Provider`] sends an assembled prompt to an LLM completion service.
//!
//! Both are traits so the aggregation and assembly pipeline can be tested
//! with in-memory stores and scripted providers.

pub mod error;
pub mod message;
pub mod provider;
pub mod records;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{AssistantError, DataAccessError, Error, Result};
pub use message::{AssistantMessage, Role};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use records::{
    BudgetCategory, IncomeSource, NewBudget, NewTransaction, Transaction, TransactionKind,
    UserId, UserRecords,
};
pub use store::RecordStore;
