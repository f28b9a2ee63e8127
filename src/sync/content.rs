//! Debounced persistence of document content
//!
//! The editor hands over the whole document on every change; only the last
//! document of a burst is written.

use super::debounce::Debouncer;
use crate::config::SyncConfig;
use crate::storage::LocalStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// The document an editor opens with when nothing is stored
pub fn default_document() -> Value {
    json!({
        "type": "doc",
        "content": [{ "type": "paragraph" }]
    })
}

pub struct ContentPersister {
    document_id: String,
    storage_key: String,
    store: Arc<dyn LocalStore>,
    debouncer: Debouncer,
    latest: Option<Value>,
}

impl ContentPersister {
    pub fn new(
        document_id: impl Into<String>,
        store: Arc<dyn LocalStore>,
        config: &SyncConfig,
    ) -> Self {
        let document_id = document_id.into();
        Self {
            storage_key: config.content_key(&document_id),
            document_id,
            store,
            debouncer: Debouncer::new(config.content_debounce()),
            latest: None,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Stored content, or [`default_document`] if absent or malformed
    pub fn load(&self) -> Value {
        match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(document_id = %self.document_id, error = %e, "stored content is malformed, using default");
                    default_document()
                }
            },
            Ok(None) => default_document(),
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "failed to read content, using default");
                default_document()
            }
        }
    }

    /// Write `content` once no newer content arrives for the debounce delay.
    pub fn schedule(&mut self, content: Value) {
        let store = Arc::clone(&self.store);
        let key = self.storage_key.clone();
        let document_id = self.document_id.clone();
        let snapshot = content.clone();
        self.latest = Some(content);
        self.debouncer.schedule(move || {
            write_content(store.as_ref(), &key, &document_id, &snapshot);
        });
    }

    /// Write `content` now. Returns false if the write failed.
    pub fn persist(&self, content: &Value) -> bool {
        write_content(self.store.as_ref(), &self.storage_key, &self.document_id, content)
    }

    /// Write the pending content immediately, if any.
    pub fn flush(&mut self) -> bool {
        if !self.debouncer.cancel() {
            return false;
        }
        match self.latest.take() {
            Some(content) => self.persist(&content),
            None => false,
        }
    }

    /// Drop any pending write. Returns true if one was pending.
    pub fn close(&mut self) -> bool {
        self.latest = None;
        self.debouncer.cancel()
    }

    pub fn has_pending_write(&self) -> bool {
        self.debouncer.is_pending()
    }
}

fn write_content(store: &dyn LocalStore, key: &str, document_id: &str, content: &Value) -> bool {
    let result = serde_json::to_string(content)
        .map_err(crate::storage::StorageError::from)
        .and_then(|json| store.set(key, &json));
    match result {
        Ok(()) => {
            debug!(document_id, "persisted document content");
            true
        }
        Err(e) => {
            warn!(document_id, error = %e, "failed to persist document content");
            false
        }
    }
}
