//! HTTP plumbing shared by the provider clients.

use finpilot_core::error::AssistantError;
use std::time::Duration;
use tracing::warn;

/// Build the shared HTTP client.
///
/// Request deadlines are enforced by [`crate::RetryProvider`], so only the
/// connect phase is bounded here.
pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a transport failure from reqwest.
pub(crate) fn transport_error(e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        AssistantError::Timeout(e.to_string())
    } else {
        AssistantError::Network(e.to_string())
    }
}

/// Turn a non-success response into an [`AssistantError`].
///
/// Returns the response untouched when the status is 2xx.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, AssistantError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    warn!(provider, status, body = %body, "Provider returned error");
    Err(status_error(status, body, retry_after_secs))
}

/// Classify an HTTP error status.
pub(crate) fn status_error(
    status: u16,
    body: String,
    retry_after_secs: Option<u64>,
) -> AssistantError {
    match status {
        401 | 403 => AssistantError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        429 => AssistantError::RateLimited {
            retry_after_secs: retry_after_secs.unwrap_or(5),
        },
        _ => AssistantError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
