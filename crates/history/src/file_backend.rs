//! File-based history: one JSON-lines file per session.
//!
//! Each line is a JSON-encoded [`Message`]. File names are the session id with
//! every byte outside `[A-Za-z0-9_-]` written as `%XX`, so arbitrary ids map to
//! safe, reversible names.

use async_trait::async_trait;
use calclaw_core::error::HistoryError;
use calclaw_core::history::HistoryStore;
use calclaw_core::message::{Message, SessionId};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

const EXTENSION: &str = "jsonl";

/// A directory of `<session>.jsonl` files.
pub struct FileHistory {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn session_path(&self, session: &SessionId) -> PathBuf {
        self.dir
            .join(format!("{}.{EXTENSION}", encode_file_stem(session.as_str())))
    }
}

fn encode_file_stem(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_file_stem(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[async_trait]
impl HistoryStore for FileHistory {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, session: &SessionId, messages: &[Message]) -> Result<(), HistoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        // Serialize the whole batch first so a failure writes nothing
        let mut content = String::new();
        for message in messages {
            let line = serde_json::to_string(message).map_err(|e| {
                HistoryError::Storage(format!("Failed to serialize message: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            HistoryError::Storage(format!("Failed to create history directory: {e}"))
        })?;

        let path = self.session_path(session);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| HistoryError::Storage(format!("Failed to open {}: {e}", path.display())))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| HistoryError::Storage(format!("Failed to write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?;

        debug!(session = %session, count = messages.len(), "Appended history");
        Ok(())
    }

    async fn read_all(&self, session: &SessionId) -> Result<Vec<Message>, HistoryError> {
        let path = self.session_path(session);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HistoryError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<Message>(line).map_err(|e| HistoryError::Corrupt {
                    session: session.to_string(),
                    reason: format!("line {}: {e}", n + 1),
                })
            })
            .collect()
    }

    async fn sessions(&self) -> Result<Vec<SessionId>, HistoryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::Storage(e.to_string())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| HistoryError::Storage(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_file_stem)
            {
                ids.push(SessionId::from(id));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calclaw_core::message::MessageToolCall;

    #[test]
    fn file_stem_encoding_is_reversible() {
        for id in ["abc-123_x", "user@example.com", "../../etc/passwd", "sessão 1"] {
            let stem = encode_file_stem(id);
            assert!(!stem.contains('/'));
            assert!(!stem.contains('.'));
            assert_eq!(decode_file_stem(&stem).as_deref(), Some(id));
        }
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let id = SessionId::from("chat-1");
        {
            let store = FileHistory::new(dir.path());
            store
                .append(
                    &id,
                    &[
                        Message::user("delete event e1"),
                        Message::tool_request(
                            "",
                            MessageToolCall {
                                id: "call_1".into(),
                                name: "delete_event".into(),
                                arguments: r#"{"event_id":"e1"}"#.into(),
                            },
                        ),
                        Message::tool_result("call_1", "delete_event", "Event (ID: e1) deleted successfully."),
                    ],
                )
                .await
                .unwrap();
        }

        let store = FileHistory::new(dir.path());
        let msgs = store.read_all(&id).await.unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].tool_calls[0].name, "delete_event");
        assert_eq!(msgs[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(store.sessions().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn missing_directory_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistory::new(dir.path().join("not-yet"));
        assert!(store.read_all(&"x".into()).await.unwrap().is_empty());
        assert!(store.sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistory::new(dir.path());
        let id = SessionId::from("broken");
        store.append(&id, &[Message::user("ok")]).await.unwrap();
        std::fs::write(
            dir.path().join("broken.jsonl"),
            format!(
                "{}\nnot json\n",
                serde_json::to_string(&Message::user("ok")).unwrap()
            ),
        )
        .unwrap();

        let err = store.read_all(&id).await.unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { ref reason, .. } if reason.contains("line 2")));
    }
}
