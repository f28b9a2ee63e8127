//! Change notifications fired by the comment synchronizer
//!
//! One event per effective change. A presentation layer subscribes instead
//! of polling the synchronizer's state.

use super::record::CommentId;

/// Why a comment left the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The user toggled the annotation off
    Explicit,
    /// Reconciliation found no matching annotation in the document
    Orphaned,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Orphaned => write!(f, "orphaned"),
        }
    }
}

/// A change to a document's comments.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentEvent {
    Added {
        document_id: String,
        comment_id: CommentId,
    },
    ContentUpdated {
        document_id: String,
        comment_id: CommentId,
    },
    Removed {
        document_id: String,
        comment_ids: Vec<CommentId>,
        reason: RemovalReason,
    },
    /// The selection moved into a comment's annotation
    Activated {
        document_id: String,
        comment_id: CommentId,
    },
    /// A persistence pass wrote `count` comments
    Persisted { document_id: String, count: usize },
    /// A persistence pass failed; in-memory state is unaffected
    PersistFailed { document_id: String, error: String },
}

impl CommentEvent {
    pub fn document_id(&self) -> &str {
        match self {
            Self::Added { document_id, .. }
            | Self::ContentUpdated { document_id, .. }
            | Self::Removed { document_id, .. }
            | Self::Activated { document_id, .. }
            | Self::Persisted { document_id, .. }
            | Self::PersistFailed { document_id, .. } => document_id,
        }
    }
}
