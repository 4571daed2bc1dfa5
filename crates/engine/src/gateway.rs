//! Assistant gateway — one bounded provider call per chat turn.
//!
//! Applies the fixed generation parameters, enforces an overall deadline,
//! supports cooperative cancellation and turns a missing reply into the
//! fallback text.

use std::sync::Arc;
use std::time::Duration;

use finpilot_core::error::AssistantError;
use finpilot_core::provider::{CompletionRequest, Provider, Usage};
use tokio::sync::watch;
use tracing::{debug, info};

/// Reply used when the provider answers without any text.
pub const FALLBACK_REPLY: &str = "I apologize, but I couldn't process your request at the moment.";

/// Fixed operational parameters, not controlled by the end user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Deadline for the whole `ask`, retries included.
    pub timeout: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 1000,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GenerationParams {
    /// Derive parameters from configuration.
    ///
    /// The deadline covers every attempt the retry layer may make.
    pub fn from_config(config: &finpilot_config::AppConfig) -> Self {
        let per_attempt = Duration::from_secs(config.request_timeout_secs);
        let timeout = if config.retry.enabled {
            per_attempt * 2 + Duration::from_millis(config.retry.backoff_ms)
        } else {
            per_attempt
        };
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout,
        }
    }
}

/// The text the provider produced for one prompt.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub text: String,
    /// True when the provider returned no text and [`FALLBACK_REPLY`] was used.
    pub fallback: bool,
    pub model: String,
    pub usage: Option<Usage>,
}

pub struct AssistantGateway {
    provider: Arc<dyn Provider>,
    model: String,
    params: GenerationParams,
}

impl AssistantGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` and return the reply text.
    pub async fn ask(&self, prompt: &str) -> Result<AssistantReply, AssistantError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            temperature: self.params.temperature,
            max_output_tokens: self.params.max_output_tokens,
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.len(),
            "Asking assistant"
        );

        let response = tokio::time::timeout(self.params.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                AssistantError::Timeout(format!(
                    "no reply within {}s",
                    self.params.timeout.as_secs_f32()
                ))
            })??;

        let (text, fallback) = match response.text {
            Some(text) if !text.trim().is_empty() => (text, false),
            _ => {
                info!(provider = %self.provider.name(), "Provider returned no reply text, using fallback");
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        Ok(AssistantReply {
            text,
            fallback,
            model: response.model,
            usage: response.usage,
        })
    }

    /// Like [`ask`](Self::ask), but gives up as soon as `cancel` turns true.
    ///
    /// The in-flight provider future is dropped on cancellation. A dropped
    /// sender never cancels.
    pub async fn ask_with_cancel(
        &self,
        prompt: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<AssistantReply, AssistantError> {
        let cancelled = async move {
            let sender_gone = cancel.wait_for(|c| *c).await.is_err();
            if sender_gone {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            reply = self.ask(prompt) => reply,
            _ = cancelled => {
                info!(provider = %self.provider.name(), "Assistant call cancelled by caller");
                Err(AssistantError::Cancelled)
            }
        }
    }
}
