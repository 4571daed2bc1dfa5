//! Bounded retry with per-attempt timeouts.
//!
//! Wraps a single provider. Each attempt is capped by `timeout`; a transient
//! failure (5xx, timeout, transport) is retried at most `max_retries` times
//! after a fixed backoff. Any 4xx fails immediately.

use async_trait::async_trait;
use finpilot_core::error::AssistantError;
use finpilot_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that retries its inner provider on transient failure.
pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
    backoff: Duration,
    max_retries: u32,
}

impl RetryProvider {
    /// Wrap `inner` with one retry, a 30s attempt timeout and 500ms backoff.
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self {
            inner,
            timeout: Duration::from_secs(30),
            backoff: Duration::from_millis(500),
            max_retries: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Disable retries; the timeout still applies.
    pub fn without_retry(mut self) -> Self {
        self.max_retries = 0;
        self
    }

    async fn attempt(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, AssistantError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(AssistantError::Timeout(format!(
                "Provider '{}' timed out after {}s",
                self.inner.name(),
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, AssistantError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        info!(provider = %self.inner.name(), attempt, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        backoff_ms = self.backoff.as_millis() as u64,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, AssistantError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A provider that replays a fixed script of outcomes.
    struct ScriptedProvider {
        script: Mutex<VecDeque<std::result::Result<String, AssistantError>>>,
        call_count: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<std::result::Result<String, AssistantError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, AssistantError> {
            *self.call_count.lock().unwrap() += 1;
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default".into()));
            next.map(|text| CompletionResponse {
                text: Some(text),
                model: "test-model".into(),
                usage: None,
            })
        }
    }

    /// A provider that hangs forever (for timeout testing).
    struct HangingProvider {
        call_count: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, AssistantError> {
            *self.call_count.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn test_request() -> CompletionRequest {
        CompletionRequest {
            model: "test".into(),
            prompt: "User: hello".into(),
            temperature: 0.3,
            max_output_tokens: 1000,
        }
    }

    fn server_error() -> AssistantError {
        AssistantError::ApiError {
            status_code: 503,
            message: "Service Unavailable".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_needs_one_call() {
        let inner = Arc::new(ScriptedProvider::new(vec![Ok("fine".into())]));
        let provider = RetryProvider::new(inner.clone());

        let resp = provider.complete(test_request()).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("fine"));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_retried_once() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Err(server_error()),
            Ok("recovered".into()),
        ]));
        let provider = RetryProvider::new(inner.clone());

        let resp = provider.complete(test_request()).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("recovered"));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_at_most_once() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Err(server_error()),
            Err(server_error()),
            Ok("too late".into()),
        ]));
        let provider = RetryProvider::new(inner.clone());

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, AssistantError::ApiError { status_code: 503, .. }));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Err(AssistantError::ApiError {
                status_code: 400,
                message: "bad request".into(),
            }),
            Ok("unused".into()),
        ]));
        let provider = RetryProvider::new(inner.clone());

        assert!(provider.complete(test_request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_not_retried() {
        let inner = Arc::new(ScriptedProvider::new(vec![Err(AssistantError::RateLimited {
            retry_after_secs: 60,
        })]));
        let provider = RetryProvider::new(inner.clone());

        assert!(matches!(
            provider.complete(test_request()).await,
            Err(AssistantError::RateLimited { .. })
        ));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported_and_retried() {
        let inner = Arc::new(HangingProvider {
            call_count: Mutex::new(0),
        });
        let provider = RetryProvider::new(inner.clone()).with_timeout(Duration::from_millis(50));

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, AssistantError::Timeout(_)));
        assert_eq!(*inner.call_count.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn without_retry_makes_a_single_attempt() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            Err(AssistantError::Network("reset".into())),
            Ok("unused".into()),
        ]));
        let provider = RetryProvider::new(inner.clone()).without_retry();

        assert!(provider.complete(test_request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }
}
