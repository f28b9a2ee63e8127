//! Collaboration session registry
//!
//! One session per (document, user) pair, shared by every component of a
//! view that needs it. The manager is an ordinary value passed by reference;
//! a session lives until it is disconnected or its document is closed. The
//! transport behind a session belongs to the hosted collaboration service
//! and is not modelled here.

use crate::config::CollabConfig;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A user's connection to a shared document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollabSession {
    pub document_id: String,
    pub user: String,
    /// Cursor colour shown to other participants
    pub color: String,
    pub app_id: String,
    pub token: String,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionManager {
    config: CollabConfig,
    sessions: DashMap<(String, String), Arc<CollabSession>>,
}

impl SessionManager {
    pub fn new(config: CollabConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    /// Return the session for this document and user, creating it on first
    /// use. A later call with a different colour returns the existing session
    /// unchanged.
    pub fn connect(&self, document_id: &str, user: &str, color: Option<&str>) -> Arc<CollabSession> {
        let key = (document_id.to_string(), user.to_string());
        self.sessions
            .entry(key)
            .or_insert_with(|| {
                info!(document_id, user, "opening collaboration session");
                Arc::new(CollabSession {
                    document_id: document_id.to_string(),
                    user: user.to_string(),
                    color: color.unwrap_or(&self.config.default_color).to_string(),
                    app_id: self.config.app_id.clone(),
                    token: self.config.token.clone(),
                    connected_at: Utc::now(),
                })
            })
            .value()
            .clone()
    }

    pub fn get(&self, document_id: &str, user: &str) -> Option<Arc<CollabSession>> {
        self.sessions
            .get(&(document_id.to_string(), user.to_string()))
            .map(|r| r.value().clone())
    }

    /// End one user's session. Returns true if it existed.
    pub fn disconnect(&self, document_id: &str, user: &str) -> bool {
        let removed = self
            .sessions
            .remove(&(document_id.to_string(), user.to_string()))
            .is_some();
        if removed {
            debug!(document_id, user, "closed collaboration session");
        }
        removed
    }

    /// End every session on a document. Returns how many were closed.
    pub fn close_document(&self, document_id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|(doc, _), _| doc != document_id);
        let closed = before - self.sessions.len();
        if closed > 0 {
            info!(document_id, closed, "closed document sessions");
        }
        closed
    }

    /// Live sessions on a document, ordered by user
    pub fn sessions_for(&self, document_id: &str) -> Vec<Arc<CollabSession>> {
        let mut sessions: Vec<Arc<CollabSession>> = self
            .sessions
            .iter()
            .filter(|r| r.key().0 == document_id)
            .map(|r| r.value().clone())
            .collect();
        sessions.sort_by(|a, b| a.user.cmp(&b.user));
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
