//! SQLite history backend.
//!
//! One table, `messages(session_id, seq, payload)`, with a unique
//! `(session_id, seq)` index. `payload` is the JSON-encoded [`Message`];
//! each append runs in a single transaction. Appends from this process are
//! serialized so the `MAX(seq)` read and the inserts never race another writer.

use async_trait::async_trait;
use calclaw_core::error::HistoryError;
use calclaw_core::history::HistoryStore;
use calclaw_core::message::{Message, SessionId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct SqliteHistory {
    pool: SqlitePool,

    /// Held for the whole append transaction
    write_lock: Mutex<()>,
}

impl SqliteHistory {
    /// Open (or create) the database file, creating parent directories.
    pub async fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                HistoryError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| HistoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        store.run_migrations().await?;
        info!(path = %path.display(), "SQLite history initialized");
        Ok(store)
    }

    /// An ephemeral database held by a single connection.
    pub async fn in_memory() -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| HistoryError::Storage(format!("Invalid SQLite path: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| HistoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), HistoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                seq         INTEGER NOT NULL,
                payload     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| HistoryError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_session_seq ON messages(session_id, seq)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| HistoryError::MigrationFailed(format!("session index: {e}")))?;

        debug!("History migrations complete");
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, session: &SessionId, messages: &[Message]) -> Result<(), HistoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        let payloads = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HistoryError::Storage(format!("Failed to serialize message: {e}")))?;

        let _writer = self.write_lock.lock().await;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(seq) + 1, 0) AS next FROM messages WHERE session_id = ?",
        )
        .bind(session.as_str())
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| row.try_get("next"))
        .map_err(|e| HistoryError::Storage(e.to_string()))?;

        for (offset, payload) in payloads.iter().enumerate() {
            sqlx::query("INSERT INTO messages (session_id, seq, payload) VALUES (?, ?, ?)")
                .bind(session.as_str())
                .bind(next + offset as i64)
                .bind(payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| HistoryError::Storage(format!("Failed to insert message: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;
        debug!(session = %session, count = messages.len(), "Appended history");
        Ok(())
    }

    async fn read_all(&self, session: &SessionId) -> Result<Vec<Message>, HistoryError> {
        let rows = sqlx::query("SELECT seq, payload FROM messages WHERE session_id = ? ORDER BY seq")
            .bind(session.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let seq: i64 = row
                    .try_get("seq")
                    .map_err(|e| HistoryError::Storage(e.to_string()))?;
                let payload: String = row
                    .try_get("payload")
                    .map_err(|e| HistoryError::Storage(e.to_string()))?;
                serde_json::from_str(&payload).map_err(|e| HistoryError::Corrupt {
                    session: session.to_string(),
                    reason: format!("seq {seq}: {e}"),
                })
            })
            .collect()
    }

    async fn sessions(&self) -> Result<Vec<SessionId>, HistoryError> {
        let rows = sqlx::query("SELECT DISTINCT session_id FROM messages ORDER BY session_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("session_id")
                    .map(SessionId::from)
                    .map_err(|e| HistoryError::Storage(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_consecutive_seq() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteHistory::open(&dir.path().join("history/calclaw.sqlite"))
            .await
            .unwrap();
        let id = SessionId::from("s1");

        store
            .append(&id, &[Message::system("sys"), Message::user("hi")])
            .await
            .unwrap();
        store.append(&id, &[Message::assistant("hello")]).await.unwrap();

        let msgs = store.read_all(&id).await.unwrap();
        let contents: Vec<&str> = msgs.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "hi", "hello"]);

        let max: i64 = sqlx::query("SELECT MAX(seq) AS m FROM messages WHERE session_id = 's1'")
            .fetch_one(&store.pool)
            .await
            .unwrap()
            .get("m");
        assert_eq!(max, 2);
    }

    #[tokio::test]
    async fn reopen_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.sqlite");
        {
            let store = SqliteHistory::open(&path).await.unwrap();
            store.append(&"a".into(), &[Message::user("persisted")]).await.unwrap();
            store.pool.close().await;
        }
        let store = SqliteHistory::open(&path).await.unwrap();
        let msgs = store.read_all(&"a".into()).await.unwrap();
        assert_eq!(msgs[0].content, "persisted");
        assert_eq!(store.sessions().await.unwrap(), vec![SessionId::from("a")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteHistory::open(&dir.path().join("h.sqlite")).await.unwrap();
        let store = std::sync::Arc::new(store);

        let mut tasks = Vec::new();
        for s in 0..32 {
            for n in 0..5 {
                let store = store.clone();
                tasks.push(tokio::spawn(async move {
                    let id = SessionId::from(format!("session-{s}"));
                    store.append(&id, &[Message::user(format!("m{n}"))]).await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.sessions().await.unwrap().len(), 32);
        for s in 0..32 {
            let id = SessionId::from(format!("session-{s}"));
            assert_eq!(store.read_all(&id).await.unwrap().len(), 5);
            let max: i64 = sqlx::query("SELECT MAX(seq) AS m FROM messages WHERE session_id = ?")
                .bind(id.as_str())
                .fetch_one(&store.pool)
                .await
                .unwrap()
                .get("m");
            assert_eq!(max, 4);
        }
    }

    #[tokio::test]
    async fn in_memory_database_works() {
        let store = SqliteHistory::in_memory().await.unwrap();
        assert!(store.read_all(&"none".into()).await.unwrap().is_empty());
        store.append(&"x".into(), &[Message::user("1")]).await.unwrap();
        store.append(&"y".into(), &[Message::user("2")]).await.unwrap();
        assert_eq!(store.sessions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_payload_is_reported() {
        let store = SqliteHistory::in_memory().await.unwrap();
        sqlx::query("INSERT INTO messages (session_id, seq, payload) VALUES ('bad', 0, '{')")
            .execute(&store.pool)
            .await
            .unwrap();
        let err = store.read_all(&"bad".into()).await.unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { ref session, .. } if session == "bad"));
    }
}
