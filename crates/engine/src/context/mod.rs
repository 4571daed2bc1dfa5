//! Bounded prompt assembly for the finance assistant.
//!
//! # Prompt sections (in order)
//!
//! | Section | Source | Limit |
//! |---------|--------|-------|
//! | Instructions | Fixed persona and protocol | Never trimmed |
//! | Conversation so far | Caller-replayed turns | Newest `max_history_messages` |
//! | Data overview | Counts and category labels | First `max_categories` labels |
//! | Financial snapshot | KPIs and records as JSON | Newest `max_transactions` |
//! | Question | The user's message | Never trimmed, always last |

pub mod assembler;
pub mod token;

pub use assembler::{
    AssembledPrompt, AssemblyInput, ContextAssembler, ContextLimits, DropInfo, PromptMetadata,
    SectionStats,
};
