//! CommentSynchronizer: keeps a document's comments consistent with its
//! annotations and persists them on a trailing debounce.
//!
//! All mutation goes through `&mut self`, so a synchronizer has exactly one
//! writer. The only asynchronous piece is the debounced write, which carries
//! an owned snapshot of the set taken at the last effective mutation.

use super::debounce::Debouncer;
use crate::comment::{Comment, CommentEvent, CommentId, CommentSet, RemovalReason};
use crate::config::SyncConfig;
use crate::host::DocumentHost;
use crate::storage::LocalStore;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

/// Comment bookkeeping for one open document
pub struct CommentSynchronizer {
    document_id: String,
    storage_key: String,
    store: Arc<dyn LocalStore>,
    comments: CommentSet,
    active: Option<CommentId>,
    debouncer: Debouncer,
    events: broadcast::Sender<CommentEvent>,
}

impl CommentSynchronizer {
    /// Create a synchronizer with an empty comment set. Nothing is read from
    /// the store; see [`open`](Self::open).
    pub fn new(
        document_id: impl Into<String>,
        store: Arc<dyn LocalStore>,
        config: &SyncConfig,
    ) -> Self {
        let document_id = document_id.into();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage_key: config.comments_key(&document_id),
            document_id,
            store,
            comments: CommentSet::new(),
            active: None,
            debouncer: Debouncer::new(config.comment_debounce()),
            events,
        }
    }

    /// Create a synchronizer and load the document's stored comments.
    pub fn open(
        document_id: impl Into<String>,
        store: Arc<dyn LocalStore>,
        config: &SyncConfig,
    ) -> Self {
        let mut sync = Self::new(document_id, store, config);
        sync.comments = sync.load();
        debug!(
            document_id = %sync.document_id,
            count = sync.comments.len(),
            "opened comment set"
        );
        sync
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn comments(&self) -> &CommentSet {
        &self.comments
    }

    /// Receive a [`CommentEvent`] for every effective change and every
    /// persistence pass.
    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    /// Append an empty comment stamped now.
    ///
    /// An id already in the set is ignored and the existing comment kept.
    pub fn add(&mut self, id: impl Into<CommentId>) -> bool {
        let comment = Comment::new(id);
        let comment_id = comment.id.clone();
        if !self.comments.insert(comment) {
            debug!(document_id = %self.document_id, %comment_id, "ignoring duplicate comment id");
            return false;
        }
        self.emit(CommentEvent::Added {
            document_id: self.document_id.clone(),
            comment_id,
        });
        self.schedule_persist();
        true
    }

    /// Generate a fresh id, add a comment for it, and return the id.
    ///
    /// The caller attaches a comment mark carrying this id to the selection.
    pub fn create(&mut self) -> CommentId {
        let id = CommentId::generate();
        self.add(id.clone());
        id
    }

    /// Remove a comment. No-op if absent.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(removed) = self.comments.remove(id) else {
            return false;
        };
        self.clear_active_if_gone();
        self.emit(CommentEvent::Removed {
            document_id: self.document_id.clone(),
            comment_ids: vec![removed.id],
            reason: RemovalReason::Explicit,
        });
        self.schedule_persist();
        true
    }

    /// Replace a comment's text. No-op if absent or unchanged.
    pub fn update_content(&mut self, id: &str, content: &str) -> bool {
        if !self.comments.update_content(id, content) {
            return false;
        }
        self.emit(CommentEvent::ContentUpdated {
            document_id: self.document_id.clone(),
            comment_id: CommentId::from(id),
        });
        self.schedule_persist();
        true
    }

    /// Drop every comment whose annotation is gone from the document.
    ///
    /// Returns the pruned ids. Calling again with the same set removes
    /// nothing and schedules no write.
    pub fn reconcile(&mut self, live_annotation_ids: &HashSet<String>) -> Vec<CommentId> {
        let removed = self.comments.retain_live(live_annotation_ids);
        if removed.is_empty() {
            return removed;
        }
        debug!(
            document_id = %self.document_id,
            pruned = removed.len(),
            "pruned orphaned comments"
        );
        self.clear_active_if_gone();
        self.emit(CommentEvent::Removed {
            document_id: self.document_id.clone(),
            comment_ids: removed.clone(),
            reason: RemovalReason::Orphaned,
        });
        self.schedule_persist();
        removed
    }

    /// Scan the document host and reconcile against what it reports.
    pub fn reconcile_with(&mut self, host: &impl DocumentHost) -> Vec<CommentId> {
        self.reconcile(&host.annotation_ids())
    }

    /// Mark a comment as the one under the selection. Unknown ids are
    /// ignored. Activation is presentation state and is never persisted.
    pub fn activate(&mut self, id: &str) -> bool {
        let Some(comment) = self.comments.get(id) else {
            return false;
        };
        if self.active.as_ref() == Some(&comment.id) {
            return false;
        }
        let comment_id = comment.id.clone();
        self.active = Some(comment_id.clone());
        self.emit(CommentEvent::Activated {
            document_id: self.document_id.clone(),
            comment_id,
        });
        true
    }

    pub fn active(&self) -> Option<&CommentId> {
        self.active.as_ref()
    }

    /// Write the current comment set to the store now.
    ///
    /// Failures are logged and reported as a `PersistFailed` event, never
    /// returned.
    pub fn persist(&self) {
        write_comments(
            self.store.as_ref(),
            &self.storage_key,
            &self.document_id,
            &self.comments,
            &self.events,
        );
    }

    /// Read the stored comment set.
    ///
    /// Absent, unreadable, or malformed data yields an empty set. Repeated ids
    /// keep their first occurrence.
    pub fn load(&self) -> CommentSet {
        let raw = match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CommentSet::new(),
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "failed to read comments, starting empty");
                return CommentSet::new();
            }
        };

        let records: Vec<Comment> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "stored comments are malformed, starting empty");
                return CommentSet::new();
            }
        };

        let (set, dropped) = CommentSet::from_records(records);
        if dropped > 0 {
            warn!(document_id = %self.document_id, dropped, "dropped stored comments with repeated ids");
        }
        set
    }

    /// Cancel any pending debounced write and persist immediately.
    pub fn flush(&mut self) {
        self.debouncer.cancel();
        self.persist();
    }

    /// Cancel any pending debounced write without persisting.
    ///
    /// Call on document teardown. Returns true if a write was pending.
    pub fn close(&mut self) -> bool {
        let cancelled = self.debouncer.cancel();
        if cancelled {
            debug!(document_id = %self.document_id, "cancelled pending comment write on close");
        }
        cancelled
    }

    pub fn has_pending_write(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn schedule_persist(&mut self) {
        let store = Arc::clone(&self.store);
        let key = self.storage_key.clone();
        let document_id = self.document_id.clone();
        let snapshot = self.comments.clone();
        let events = self.events.clone();
        self.debouncer.schedule(move || {
            write_comments(store.as_ref(), &key, &document_id, &snapshot, &events);
        });
    }

    fn clear_active_if_gone(&mut self) {
        if let Some(active) = &self.active {
            if !self.comments.contains(active.as_str()) {
                self.active = None;
            }
        }
    }

    fn emit(&self, event: CommentEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn write_comments(
    store: &dyn LocalStore,
    key: &str,
    document_id: &str,
    comments: &CommentSet,
    events: &broadcast::Sender<CommentEvent>,
) {
    let result = serde_json::to_string(comments)
        .map_err(crate::storage::StorageError::from)
        .and_then(|json| store.set(key, &json));

    let event = match result {
        Ok(()) => {
            debug!(document_id, count = comments.len(), "persisted comments");
            CommentEvent::Persisted {
                document_id: document_id.to_string(),
                count: comments.len(),
            }
        }
        Err(e) => {
            warn!(document_id, error = %e, "failed to persist comments");
            CommentEvent::PersistFailed {
                document_id: document_id.to_string(),
                error: e.to_string(),
            }
        }
    };
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError, StorageResult};

    struct BrokenStore;

    impl LocalStore for BrokenStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn remove(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn keys_with_prefix(&self, _prefix: &str) -> StorageResult<Vec<String>> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    fn live(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn memory_sync() -> (Arc<MemoryStore>, CommentSynchronizer) {
        let store = Arc::new(MemoryStore::new());
        let sync = CommentSynchronizer::new("doc-1", store.clone(), &SyncConfig::default());
        (store, sync)
    }

    #[test]
    fn add_update_reconcile_scenario() {
        let (_, mut sync) = memory_sync();
        assert!(sync.add("c-1"));
        assert!(sync.update_content("c-1", "hello"));

        assert!(sync.reconcile(&live(&["c-1"])).is_empty());
        assert_eq!(sync.comments().len(), 1);
        let comment = sync.comments().get("c-1").unwrap();
        assert_eq!(comment.content, "hello");

        let removed = sync.reconcile(&HashSet::new());
        assert_eq!(removed, vec![CommentId::from("c-1")]);
        assert!(sync.comments().is_empty());
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let (_, mut sync) = memory_sync();
        assert!(sync.add("c-1"));
        sync.update_content("c-1", "keep me");
        assert!(!sync.add("c-1"));
        assert_eq!(sync.comments().len(), 1);
        assert_eq!(sync.comments().get("c-1").unwrap().content, "keep me");
    }

    #[test]
    fn missing_ids_are_silent_noops() {
        let (_, mut sync) = memory_sync();
        assert!(!sync.remove("c-404"));
        assert!(!sync.update_content("c-404", "x"));
        assert!(!sync.activate("c-404"));
        assert!(!sync.has_pending_write());
    }

    #[test]
    fn create_generates_prefixed_id() {
        let (_, mut sync) = memory_sync();
        let id = sync.create();
        assert!(id.as_str().starts_with("c-"));
        assert!(sync.comments().contains(id.as_str()));
    }

    #[test]
    fn removing_active_comment_clears_it() {
        let (_, mut sync) = memory_sync();
        sync.add("c-1");
        sync.add("c-2");
        assert!(sync.activate("c-2"));
        assert!(!sync.activate("c-2"));
        assert_eq!(sync.active().map(|id| id.as_str()), Some("c-2"));

        sync.reconcile(&live(&["c-1"]));
        assert_eq!(sync.active(), None);
    }

    #[test]
    fn persist_then_load_round_trips() {
        let (store, mut sync) = memory_sync();
        sync.add("c-1");
        sync.add("c-2");
        sync.update_content("c-2", "second");
        sync.persist();

        let reopened = CommentSynchronizer::open("doc-1", store, &SyncConfig::default());
        assert_eq!(reopened.comments(), sync.comments());
    }

    #[test]
    fn load_malformed_is_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("comments:doc-1", "{ this is not json").unwrap();
        let sync = CommentSynchronizer::open("doc-1", store, &SyncConfig::default());
        assert!(sync.comments().is_empty());
    }

    #[test]
    fn load_wrong_shape_is_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("comments:doc-1", r#"{"id":"c-1"}"#).unwrap();
        let sync = CommentSynchronizer::open("doc-1", store, &SyncConfig::default());
        assert!(sync.comments().is_empty());
    }

    #[test]
    fn load_drops_repeated_ids() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "comments:doc-1",
                r#"[{"id":"c-1","content":"a","createdAt":"2024-01-01T00:00:00Z"},
                    {"id":"c-1","content":"b","createdAt":"2024-01-01T00:00:01Z"}]"#,
            )
            .unwrap();
        let sync = CommentSynchronizer::open("doc-1", store, &SyncConfig::default());
        assert_eq!(sync.comments().len(), 1);
        assert_eq!(sync.comments().get("c-1").unwrap().content, "a");
    }

    #[test]
    fn unavailable_store_never_raises() {
        let mut sync = CommentSynchronizer::open("doc-1", Arc::new(BrokenStore), &SyncConfig::default());
        assert!(sync.comments().is_empty());
        let mut events = sync.subscribe();

        sync.add("c-1");
        sync.flush();
        assert_eq!(sync.comments().len(), 1);

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, CommentEvent::PersistFailed { .. }) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test(start_paused = true)]
    async fn events_describe_changes() {
        let (_, mut sync) = memory_sync();
        let mut events = sync.subscribe();

        sync.add("c-1");
        sync.update_content("c-1", "x");
        sync.remove("c-1");

        assert!(matches!(events.try_recv().unwrap(), CommentEvent::Added { .. }));
        assert!(matches!(events.try_recv().unwrap(), CommentEvent::ContentUpdated { .. }));
        match events.try_recv().unwrap() {
            CommentEvent::Removed { reason, comment_ids, .. } => {
                assert_eq!(reason, RemovalReason::Explicit);
                assert_eq!(comment_ids, vec![CommentId::from("c-1")]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn without_runtime_mutations_wait_for_flush() {
        let (store, mut sync) = memory_sync();
        sync.add("c-1");
        sync.update_content("c-1", "draft");
        sync.update_content("c-1", "final");

        assert!(sync.has_pending_write());
        assert_eq!(store.get("comments:doc-1").unwrap(), None);

        sync.flush();
        assert!(!sync.has_pending_write());
        assert_eq!(sync.load().get("c-1").unwrap().content, "final");
    }

    #[tokio::test(start_paused = true)]
    async fn noop_reconcile_schedules_nothing() {
        let (_, mut sync) = memory_sync();
        sync.add("c-1");
        sync.flush();
        assert!(!sync.has_pending_write());

        sync.reconcile(&live(&["c-1"]));
        assert!(!sync.has_pending_write());
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_write() {
        let (store, mut sync) = memory_sync();
        sync.add("c-1");
        assert!(sync.has_pending_write());
        assert!(sync.close());

        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.get("comments:doc-1").unwrap(), None);
    }
}
