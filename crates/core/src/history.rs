use tracing::{debug, warn};

use crate::{
    error::PersistenceError,
    storage::{KeyValueStore, history_key},
    types::{ChatMessage, HistoryScope},
};

/// Load a Q&A transcript. Absent or unreadable data is an empty transcript.
pub fn load_history<S: KeyValueStore>(storage: &S, scope: &HistoryScope) -> Vec<ChatMessage> {
    let key = history_key(scope);
    match storage.get(&key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "discarding malformed chat history");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(key = %key, error = %e, "could not read chat history");
            Vec::new()
        }
    }
}

/// Write a transcript. Failures are logged, never returned.
pub fn save_history<S: KeyValueStore>(storage: &S, scope: &HistoryScope, messages: &[ChatMessage]) {
    let key = history_key(scope);
    let result = serde_json::to_string(messages)
        .map_err(PersistenceError::from)
        .and_then(|json| storage.set(&key, &json));
    match result {
        Ok(()) => debug!(key = %key, messages = messages.len(), "chat history saved"),
        Err(e) => warn!(key = %key, error = %e, "could not save chat history"),
    }
}

/// Forget a transcript entirely.
pub fn clear_history<S: KeyValueStore>(storage: &S, scope: &HistoryScope) {
    let key = history_key(scope);
    match storage.remove(&key) {
        Ok(()) => debug!(key = %key, "chat history cleared"),
        Err(e) => warn!(key = %key, error = %e, "could not clear chat history"),
    }
}
