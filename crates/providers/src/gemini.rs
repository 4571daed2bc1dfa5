//! Google Gemini provider (`generateContent` REST endpoint).
//!
//! The whole assembled prompt travels as a single text part. The reply is
//! read from `candidates[0].content.parts[0].text`; a response without that
//! field is not an error, it yields `text: None`.

use async_trait::async_trait;
use finpilot_core::error::AssistantError;
use finpilot_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(),
        }
    }

    /// Point the provider at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn to_api_request(request: &CompletionRequest) -> ApiRequest<'_> {
        ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    fn from_api_response(response: ApiResponse, requested_model: &str) -> CompletionResponse {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        let usage = response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        CompletionResponse {
            text,
            model: response
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            usage,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, AssistantError> {
        let url = self.endpoint(&request.model);
        let body = Self::to_api_request(&request);

        debug!(provider = "gemini", model = %request.model, prompt_chars = request.prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let response = http::check_status("gemini", response).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Ok(Self::from_api_response(api_response, &request.model))
    }

    async fn health_check(&self) -> std::result::Result<bool, AssistantError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(http::transport_error)?;
        Ok(response.status().is_success())
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<ApiContent<'a>>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct ApiContent<'a> {
    parts: Vec<ApiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
