//! Provider construction from configuration.
//!
//! Picks the client for `config.provider`, resolves its key, base URL and
//! model, and wraps it in a [`RetryProvider`] with the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use finpilot_config::AppConfig;
use finpilot_core::error::{Error, Result};
use finpilot_core::provider::Provider;
use tracing::info;

use crate::gemini::{GEMINI_BASE_URL, GeminiProvider};
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryProvider;

/// The configured provider plus the model name to request from it.
pub struct ResolvedProvider {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

/// Build the active provider from configuration.
///
/// Fails with [`Error::Config`] when a provider that needs a key has none.
pub fn build_from_config(config: &AppConfig) -> Result<ResolvedProvider> {
    let name = config.provider.as_str();
    let overrides = config.providers.get(name);

    let api_key = config.resolved_api_key().map(str::to_string);
    let base_url = overrides
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));
    let model = overrides
        .and_then(|p| p.model.clone())
        .unwrap_or_else(|| config.model.clone());

    let inner: Arc<dyn Provider> = match name {
        "ollama" | "vllm" | "llamacpp" | "llama.cpp" => Arc::new(OpenAiCompatProvider::new(
            name,
            &base_url,
            api_key.unwrap_or_else(|| "local".into()),
        )),
        "gemini" => {
            let key = require_key(name, api_key)?;
            Arc::new(GeminiProvider::new(key).with_base_url(&base_url))
        }
        _ => {
            let key = require_key(name, api_key)?;
            Arc::new(OpenAiCompatProvider::new(name, &base_url, key))
        }
    };

    let mut provider = RetryProvider::new(inner)
        .with_timeout(Duration::from_secs(config.request_timeout_secs))
        .with_backoff(Duration::from_millis(config.retry.backoff_ms));
    if !config.retry.enabled {
        provider = provider.without_retry();
    }

    info!(provider = name, model = %model, base_url = %base_url, "Provider configured");

    Ok(ResolvedProvider {
        provider: Arc::new(provider),
        model,
    })
}

fn require_key(provider: &str, key: Option<String>) -> Result<String> {
    key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        Error::config(format!(
            "no API key for provider '{provider}'; set FINPILOT_API_KEY or api_key in config.toml"
        ))
    })
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" => GEMINI_BASE_URL.into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finpilot_config::ProviderConfig;

    #[test]
    fn gemini_without_key_is_a_config_error() {
        let config = AppConfig::default();
        match build_from_config(&config) {
            Err(Error::Config { message }) => assert!(message.contains("gemini")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }

    #[test]
    fn gemini_with_key_builds() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        let resolved = build_from_config(&config).unwrap();
        assert_eq!(resolved.provider.name(), "gemini");
        assert_eq!(resolved.model, "gemini-2.0-flash");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = AppConfig {
            provider: "ollama".into(),
            model: "llama3".into(),
            ..AppConfig::default()
        };
        let resolved = build_from_config(&config).unwrap();
        assert_eq!(resolved.provider.name(), "ollama");
    }

    #[test]
    fn per_provider_model_overrides_top_level() {
        let mut config = AppConfig {
            provider: "openai".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                api_url: None,
                model: Some("gpt-4o-mini".into()),
            },
        );
        let resolved = build_from_config(&config).unwrap();
        assert_eq!(resolved.provider.name(), "openai");
        assert_eq!(resolved.model, "gpt-4o-mini");
    }

    #[test]
    fn known_base_urls() {
        assert!(default_base_url("gemini").contains("generativelanguage.googleapis.com"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("11434"));
    }
}
