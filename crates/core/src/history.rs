//! HistoryStore trait: per-session conversation persistence.
//!
//! The store is keyed by [`SessionId`] and only needs two operations:
//! append a batch of messages and read a session back in order. Durability is
//! whatever the backend provides.

use crate::error::HistoryError;
use crate::message::{Message, SessionId};
use async_trait::async_trait;

/// Implementations: in-memory (tests, ephemeral), JSONL files, SQLite.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g. "sqlite", "file", "memory").
    fn name(&self) -> &str;

    /// Append messages to the end of a session, creating it if needed.
    ///
    /// The batch is written atomically: either every message lands or none.
    async fn append(&self, session: &SessionId, messages: &[Message]) -> Result<(), HistoryError>;

    /// Every message of a session in insertion order; empty for unknown ids.
    async fn read_all(&self, session: &SessionId) -> Result<Vec<Message>, HistoryError>;

    /// Known session ids.
    async fn sessions(&self) -> Result<Vec<SessionId>, HistoryError>;
}
