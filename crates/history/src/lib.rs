//! Conversation history stores for calclaw.

pub mod file_backend;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file_backend::FileHistory;
pub use in_memory::InMemoryHistory;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteHistory;

use calclaw_config::{HistoryConfig, resolve_in};
use calclaw_core::error::HistoryError;
use calclaw_core::history::HistoryStore;
use std::path::Path;
use std::sync::Arc;

/// Open the configured backend; relative paths resolve under `base_dir`.
pub async fn open(config: &HistoryConfig, base_dir: &Path) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryHistory::new())),
        "file" => Ok(Arc::new(FileHistory::new(resolve_in(base_dir, &config.path)))),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(
            SqliteHistory::open(&resolve_in(base_dir, &config.path)).await?,
        )),
        other => Err(HistoryError::Storage(format!("unknown history backend '{other}'"))),
    }
}
