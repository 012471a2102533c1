use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::io::synclog::{self, LogCategory, LogEntry};
use crate::model::ticket::TicketStore;
use crate::parse::{parse_store, serialize_store};

/// Error type for ticket store I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read ticket store: {0}")]
    ReadError(#[source] std::io::Error),
    #[error("could not write ticket store: {0}")]
    WriteError(#[source] std::io::Error),
}

/// Load the ticket store from `tickets.tsv` in the workspace directory.
///
/// A missing file is an empty store (first run). Rows the parser had to
/// drop are recorded in the sync log so hand-edits aren't silently lost.
pub fn load_store(dir: &Path) -> Result<TicketStore, StoreError> {
    let path = dir.join("tickets.tsv");
    if !path.exists() {
        return Ok(TicketStore::new());
    }
    let content = fs::read_to_string(&path).map_err(StoreError::ReadError)?;
    let (store, dropped) = parse_store(&content);
    if !dropped.is_empty() {
        synclog::log_event(
            dir,
            LogEntry {
                timestamp: Utc::now(),
                category: LogCategory::Parse,
                description: "dropped rows".to_string(),
                fields: vec![("Source".to_string(), "tickets.tsv".to_string())],
                body: dropped.join("\n"),
            },
        );
    }
    Ok(store)
}

/// Save the ticket store atomically. On failure the serialized content is
/// preserved in the sync log before the error propagates.
pub fn save_store(dir: &Path, store: &TicketStore) -> Result<(), StoreError> {
    let path = dir.join("tickets.tsv");
    let content = serialize_store(store);
    if let Err(e) = synclog::atomic_write(&path, content.as_bytes()) {
        synclog::log_event(
            dir,
            LogEntry {
                timestamp: Utc::now(),
                category: LogCategory::Write,
                description: "store write failed".to_string(),
                fields: vec![
                    ("Target".to_string(), "tickets.tsv".to_string()),
                    ("Error".to_string(), e.to_string()),
                ],
                body: content,
            },
        );
        return Err(StoreError::WriteError(e));
    }
    Ok(())
}
