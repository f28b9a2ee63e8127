//! Document catalog: which documents have stored state, and deleting it

use crate::config::SyncConfig;
use crate::storage::{LocalStore, StorageResult};
use std::collections::BTreeSet;
use tracing::debug;

/// Ids of every document with stored comments or content, sorted.
pub fn list_documents(store: &dyn LocalStore, config: &SyncConfig) -> StorageResult<Vec<String>> {
    let mut documents = BTreeSet::new();
    for prefix in [&config.comments_key_prefix, &config.content_key_prefix] {
        for key in store.keys_with_prefix(prefix)? {
            if let Some(document_id) = key.strip_prefix(prefix.as_str()) {
                if !document_id.is_empty() {
                    documents.insert(document_id.to_string());
                }
            }
        }
    }
    Ok(documents.into_iter().collect())
}

/// Delete a document's stored comments and content.
///
/// Returns true if anything was stored. Open synchronizers for the document
/// still hold their state and will write it back on their next persist.
pub fn delete_document(
    store: &dyn LocalStore,
    config: &SyncConfig,
    document_id: &str,
) -> StorageResult<bool> {
    let comments = store.remove(&config.comments_key(document_id))?;
    let content = store.remove(&config.content_key(document_id))?;
    debug!(document_id, comments, content, "deleted stored document");
    Ok(comments || content)
}
