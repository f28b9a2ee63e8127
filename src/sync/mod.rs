//! Synchronization of comment and content state with local storage

mod catalog;
mod content;
mod debounce;
mod session;
mod synchronizer;

pub use catalog::{delete_document, list_documents};
pub use content::{default_document, ContentPersister};
pub use debounce::Debouncer;
pub use session::DocumentSession;
pub use synchronizer::CommentSynchronizer;
