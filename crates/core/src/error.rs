//! Error types for the FinPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The taxonomy mirrors
//! how each failure is handled:
//!
//! - [`Error::Config`] — missing credential or URL; the request fails at once.
//! - [`DataAccessError`] — the store cannot supply records; the request fails.
//! - [`AssistantError`] — the provider call failed; the relay recovers it.
//! - [`Error::Validation`] — a malformed record rejected before aggregation.

use thiserror::Error;

/// The top-level error type for all FinPilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Store errors ---
    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    // --- Provider errors ---
    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    // --- Record validation ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure of the LLM provider call.
#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request cancelled by caller")]
    Cancelled,
}

impl AssistantError {
    /// Whether a second attempt could plausibly succeed.
    ///
    /// Server errors, timeouts and transport failures are transient. Every
    /// 4xx, including rate limiting, is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::Timeout(_) | Self::Network(_) => true,
            Self::RateLimited { .. }
            | Self::AuthenticationFailed(_)
            | Self::MalformedResponse(_)
            | Self::Cancelled => false,
        }
    }
}

/// Failure of the record store.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Malformed record {table}#{id}: {reason}")]
    MalformedRecord {
        table: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_error_displays_correctly() {
        let err = Error::Assistant(AssistantError::ApiError {
            status_code: 503,
            message: "Service unavailable".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Service unavailable"));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = AssistantError::ApiError {
            status_code: 502,
            message: String::new(),
        };
        assert!(err.is_transient());
        assert!(AssistantError::Timeout("30s".into()).is_transient());
        assert!(AssistantError::Network("reset".into()).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = AssistantError::ApiError {
            status_code: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_transient());
        assert!(!AssistantError::AuthenticationFailed("bad key".into()).is_transient());
        assert!(!AssistantError::Cancelled.is_transient());
        assert!(!AssistantError::RateLimited { retry_after_secs: 5 }.is_transient());
    }

    #[test]
    fn malformed_record_names_the_row() {
        let err = DataAccessError::MalformedRecord {
            table: "transactions",
            id: 42,
            reason: "unknown transaction_type 'refund'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("transactions#42"));
        assert!(msg.contains("refund"));
    }
}
