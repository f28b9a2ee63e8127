//! Marginalia: comment bookkeeping for rich-text documents
//!
//! Keeps a document's inline comments consistent with the `comment` marks
//! that anchor them, and persists comments and content to local storage
//! without blocking the editor.
//!
//! # Core Concepts
//!
//! - **Comments**: records keyed by the id carried on their anchoring mark
//! - **Reconciliation**: pruning comments whose mark left the document
//! - **Debounced persistence**: a burst of changes ends in one write
//!
//! # Example
//!
//! ```
//! use marginalia::{CommentSynchronizer, MemoryStore, SyncConfig};
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! let mut sync = CommentSynchronizer::open("doc", Arc::new(MemoryStore::new()), &SyncConfig::default());
//! sync.add("c-1");
//! sync.update_content("c-1", "hello");
//! sync.reconcile(&HashSet::new());
//! assert!(sync.comments().is_empty());
//! ```

pub mod collab;
pub mod comment;
pub mod config;
pub mod host;
pub mod storage;
pub mod sync;

pub use collab::{CollabSession, SessionManager};
pub use comment::{Comment, CommentEvent, CommentId, CommentSet, RemovalReason};
pub use config::{CollabConfig, ConfigError, MarginaliaConfig, SyncConfig};
pub use host::{DocumentHost, JsonDocument};
pub use storage::{LocalStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use sync::{
    delete_document, list_documents, CommentSynchronizer, ContentPersister, Debouncer,
    DocumentSession,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
