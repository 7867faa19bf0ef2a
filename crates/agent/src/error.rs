use calclaw_core::error::{HistoryError, ProviderError};
use thiserror::Error;

/// Turn-level failures. Nothing of the failed turn is persisted.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Conversation history unavailable: {0}")]
    History(#[from] HistoryError),
}
