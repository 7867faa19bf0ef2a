//! In-memory history: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use calclaw_core::error::HistoryError;
use calclaw_core::history::HistoryStore;
use calclaw_core::message::{Message, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every session in a map; lost when the process exits.
pub struct InMemoryHistory {
    sessions: Arc<RwLock<HashMap<SessionId, Vec<Message>>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, session: &SessionId, messages: &[Message]) -> Result<(), HistoryError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn read_all(&self, session: &SessionId) -> Result<Vec<Message>, HistoryError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn sessions(&self) -> Result<Vec<SessionId>, HistoryError> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_in_order() {
        let store = InMemoryHistory::new();
        let id = SessionId::from("s1");
        store
            .append(&id, &[Message::user("a"), Message::assistant("b")])
            .await
            .unwrap();
        store.append(&id, &[Message::user("c")]).await.unwrap();

        let msgs = store.read_all(&id).await.unwrap();
        let contents: Vec<&str> = msgs.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let store = InMemoryHistory::new();
        assert!(store.read_all(&SessionId::from("nope")).await.unwrap().is_empty());
        assert!(store.sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemoryHistory::new();
        store.append(&"b".into(), &[Message::user("for b")]).await.unwrap();
        store.append(&"a".into(), &[Message::user("for a")]).await.unwrap();

        let a = store.read_all(&"a".into()).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].content, "for a");
        assert_eq!(
            store.sessions().await.unwrap(),
            vec![SessionId::from("a"), SessionId::from("b")]
        );
    }
}
