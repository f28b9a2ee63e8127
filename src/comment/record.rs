//! A single comment anchored to a `comment` mark in the document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of generated comment ids (`c-<uuid>`).
///
/// Ids double as DOM element ids in the editor front end, so they must not
/// start with a digit.
pub const COMMENT_ID_PREFIX: &str = "c-";

/// Identifier carried as the `commentId` attribute of a comment mark
///
/// Serializes as a plain string. Ids read back from storage or from the
/// document are opaque and need not follow the generated format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// Generate a fresh id of the form `c-<uuid v4>`
    pub fn generate() -> Self {
        Self(format!("{}{}", COMMENT_ID_PREFIX, Uuid::new_v4()))
    }

    /// Wrap an existing id string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CommentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CommentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A comment record
///
/// The wire shape matches what the editor front end keeps in local storage:
/// `{"id": "...", "content": "...", "createdAt": "<rfc3339>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create an empty comment stamped with the current time
    pub fn new(id: impl Into<CommentId>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a comment with an explicit creation time
    pub fn with_created_at(id: impl Into<CommentId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            created_at,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}
