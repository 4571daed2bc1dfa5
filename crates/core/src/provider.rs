//! Provider trait — the abstraction over LLM text-completion backends.
//!
//! A Provider knows how to send one assembled prompt to an LLM and get the
//! reply text back. There is no multi-turn wire history: prior turns, if
//! any, are already rendered into the prompt by the context assembler.
//!
//! Implementations: Gemini, OpenAI-compatible, and the retrying wrapper.

use crate::error::AssistantError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gemini-2.0-flash", "gpt-4o-mini")
    pub model: String,

    /// The full assembled prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.3
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated reply, if the provider returned one.
    ///
    /// `None` is not an error: the gateway substitutes a fallback reply.
    pub text: Option<String>,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The assistant gateway calls `complete()` without knowing which backend
/// is configured.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, AssistantError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, AssistantError> {
        Ok(true)
    }
}
