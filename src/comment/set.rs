//! CommentSet: the ordered comments of one document

use super::record::{Comment, CommentId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered comments of a document, unique by id
///
/// Insertion order is display order. Serializes as a JSON array of
/// [`Comment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentSet {
    comments: Vec<Comment>,
}

impl CommentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from records that may repeat ids.
    ///
    /// The first occurrence of an id wins. Returns the set and the number of
    /// records dropped.
    pub fn from_records(records: Vec<Comment>) -> (Self, usize) {
        let mut seen = HashSet::with_capacity(records.len());
        let total = records.len();
        let comments: Vec<Comment> = records
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        let dropped = total - comments.len();
        (Self { comments }, dropped)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<CommentId> {
        self.comments.iter().map(|c| c.id.clone()).collect()
    }

    /// Append a comment. Returns false, leaving the set untouched, if the id
    /// is already present.
    pub fn insert(&mut self, comment: Comment) -> bool {
        if self.contains(comment.id.as_str()) {
            return false;
        }
        self.comments.push(comment);
        true
    }

    /// Remove the comment with this id, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Comment> {
        let pos = self.comments.iter().position(|c| c.id.as_str() == id)?;
        Some(self.comments.remove(pos))
    }

    /// Replace a comment's text. Returns true only if the text changed.
    pub fn update_content(&mut self, id: &str, content: &str) -> bool {
        match self.comments.iter_mut().find(|c| c.id.as_str() == id) {
            Some(comment) if comment.content != content => {
                comment.content = content.to_string();
                true
            }
            _ => false,
        }
    }

    /// Drop every comment whose id is not in `live`. Returns the removed ids
    /// in their former display order.
    pub fn retain_live(&mut self, live: &HashSet<String>) -> Vec<CommentId> {
        let mut removed = Vec::new();
        self.comments.retain(|c| {
            let keep = live.contains(c.id.as_str());
            if !keep {
                removed.push(c.id.clone());
            }
            keep
        });
        removed
    }
}

impl<'a> IntoIterator for &'a CommentSet {
    type Item = &'a Comment;
    type IntoIter = std::slice::Iter<'a, Comment>;

    fn into_iter(self) -> Self::IntoIter {
        self.comments.iter()
    }
}
