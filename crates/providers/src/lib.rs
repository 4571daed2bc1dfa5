//! LLM Provider implementations for FinPilot.
//!
//! All providers implement the `finpilot_core::Provider` trait.
//! [`build_from_config`] selects and wraps the configured one.

pub mod gemini;
mod http;
pub mod openai_compat;
pub mod retry;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use router::{ResolvedProvider, build_from_config, default_base_url};
