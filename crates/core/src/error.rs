//! Error types for the calclaw domain.
//!
//! Each bounded context has its own `thiserror` enum; [`Error`] aggregates them.

use thiserror::Error;

/// The top-level error type for all calclaw operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the LLM.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures resolving or running a tool.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

/// Failures talking to the remote calendar provider.
#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("calendar service unavailable: {0}")]
    Unavailable(String),

    #[error("<HttpError {status}: {message}>")]
    Api { status: u16, message: String },

    #[error("<HttpError 404: {0}>")]
    NotFound(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Failures in the conversation history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt history for session {session}: {reason}")]
    Corrupt { session: String, reason: String },

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_mentions_name() {
        let err = ToolError::NotFound("book_flight".into());
        assert_eq!(err.to_string(), "Tool not found: book_flight");
    }

    #[test]
    fn calendar_api_error_carries_remote_message() {
        let err = CalendarError::Api {
            status: 403,
            message: "Rate Limit Exceeded".into(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Rate Limit Exceeded"));
    }
}
