//! Comment records and the per-document comment set

mod events;
mod record;
mod set;


pub use events::{CommentEvent, RemovalReason};
pub use record::{Comment, CommentId, COMMENT_ID_PREFIX};
pub use set::CommentSet;
