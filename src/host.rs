//! Document content host: where live comment annotations are discovered
//!
//! The editor framework owns the document model. Comment bookkeeping only
//! needs one thing from it: the set of `commentId`s still attached to
//! content. `JsonDocument` answers that for the framework's JSON document
//! format, in which every node may carry `marks` and `content` children:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "paragraph", "content": [
//!     {"type": "text", "text": "hi",
//!      "marks": [{"type": "comment", "attrs": {"commentId": "c-1"}}]}
//!   ]}
//! ]}
//! ```

use serde_json::Value;
use std::collections::HashSet;

/// Name of the mark type that anchors comments
pub const COMMENT_MARK: &str = "comment";

/// Mark attribute holding the comment id
pub const COMMENT_ID_ATTR: &str = "commentId";

/// A source of live annotation ids
pub trait DocumentHost {
    /// Ids of every comment annotation currently attached anywhere in the
    /// content tree
    fn annotation_ids(&self) -> HashSet<String>;
}

impl<T: DocumentHost + ?Sized> DocumentHost for &T {
    fn annotation_ids(&self) -> HashSet<String> {
        (**self).annotation_ids()
    }
}

/// A document in the editor's JSON format
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_inner(self) -> Value {
        self.root
    }
}

impl DocumentHost for JsonDocument {
    fn annotation_ids(&self) -> HashSet<String> {
        scan_comment_ids(&self.root)
    }
}

/// Collect comment ids from every node of a JSON document tree.
///
/// Marks without a non-empty string `commentId` are ignored, as are marks of
/// any other type. Nodes that are not objects are skipped.
pub fn scan_comment_ids(root: &Value) -> HashSet<String> {
    let mut ids = HashSet::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let Some(obj) = node.as_object() else {
            continue;
        };

        if let Some(marks) = obj.get("marks").and_then(Value::as_array) {
            for mark in marks {
                if mark.get("type").and_then(Value::as_str) != Some(COMMENT_MARK) {
                    continue;
                }
                let id = mark
                    .get("attrs")
                    .and_then(|attrs| attrs.get(COMMENT_ID_ATTR))
                    .and_then(Value::as_str);
                if let Some(id) = id.filter(|id| !id.is_empty()) {
                    ids.insert(id.to_string());
                }
            }
        }

        if let Some(children) = obj.get("content").and_then(Value::as_array) {
            stack.extend(children.iter());
        }
    }

    ids
}
