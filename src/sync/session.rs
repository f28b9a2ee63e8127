//! DocumentSession: bookkeeping for one open document view
//!
//! Lives exactly as long as the view. Every content change is saved on a
//! debounce and used to prune orphaned comments; closing cancels both
//! timers so nothing is written after teardown.

use super::content::ContentPersister;
use super::synchronizer::CommentSynchronizer;
use crate::comment::CommentId;
use crate::config::SyncConfig;
use crate::host::JsonDocument;
use crate::storage::LocalStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct DocumentSession {
    document_id: String,
    comments: CommentSynchronizer,
    content: ContentPersister,
    document: JsonDocument,
}

impl DocumentSession {
    /// Load stored comments and content for `document_id`.
    ///
    /// Loading never fails: missing or malformed data falls back to an empty
    /// comment set and the default document.
    pub fn open(
        document_id: impl Into<String>,
        store: Arc<dyn LocalStore>,
        config: &SyncConfig,
    ) -> Self {
        let document_id = document_id.into();
        let comments = CommentSynchronizer::open(document_id.clone(), Arc::clone(&store), config);
        let content = ContentPersister::new(document_id.clone(), store, config);
        let document = JsonDocument::new(content.load());
        debug!(%document_id, "opened document session");
        Self {
            document_id,
            comments,
            content,
            document,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn document(&self) -> &JsonDocument {
        &self.document
    }

    pub fn comments(&self) -> &CommentSynchronizer {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut CommentSynchronizer {
        &mut self.comments
    }

    /// Handle a content-change notification from the editor.
    ///
    /// Schedules a content write and prunes comments whose annotation is
    /// gone. Returns the pruned ids.
    pub fn on_content_changed(&mut self, content: Value) -> Vec<CommentId> {
        self.content.schedule(content.clone());
        self.document = JsonDocument::new(content);
        self.comments.reconcile_with(&self.document)
    }

    /// Write pending comments and content immediately.
    pub fn flush(&mut self) {
        self.content.flush();
        self.comments.flush();
    }

    /// Tear down: cancel pending writes without performing them.
    ///
    /// Returns true if anything was pending.
    pub fn close(mut self) -> bool {
        let comments = self.comments.close();
        let content = self.content.close();
        debug!(document_id = %self.document_id, "closed document session");
        comments || content
    }

    pub fn has_pending_writes(&self) -> bool {
        self.comments.has_pending_write() || self.content.has_pending_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn doc_with_comments(ids: &[&str]) -> Value {
        let spans: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "type": "text",
                    "text": "anchored",
                    "marks": [{ "type": "comment", "attrs": { "commentId": id } }]
                })
            })
            .collect();
        json!({ "type": "doc", "content": [{ "type": "paragraph", "content": spans }] })
    }

    #[test]
    fn opens_with_defaults_on_empty_store() {
        let session = DocumentSession::open("doc-1", Arc::new(MemoryStore::new()), &SyncConfig::default());
        assert!(session.comments().comments().is_empty());
        assert_eq!(session.document().root()["type"], "doc");
    }

    #[tokio::test(start_paused = true)]
    async fn content_change_prunes_orphans() {
        let mut session = DocumentSession::open("doc-1", Arc::new(MemoryStore::new()), &SyncConfig::default());
        session.comments_mut().add("c-1");
        session.comments_mut().add("c-2");

        let pruned = session.on_content_changed(doc_with_comments(&["c-2"]));
        assert_eq!(pruned, vec![CommentId::from("c-1")]);
        assert!(session.has_pending_writes());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_then_reopen_restores_state() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let mut session = DocumentSession::open("doc-1", Arc::clone(&store), &SyncConfig::default());
        session.comments_mut().add("c-1");
        session.comments_mut().update_content("c-1", "kept");
        session.on_content_changed(doc_with_comments(&["c-1"]));
        session.flush();
        assert!(!session.close());

        let reopened = DocumentSession::open("doc-1", store, &SyncConfig::default());
        assert_eq!(reopened.comments().comments().get("c-1").unwrap().content, "kept");
        assert_eq!(reopened.document().root(), &doc_with_comments(&["c-1"]));
    }
}
