//! Storage backends for Marginalia
//!
//! Comment sets and document content are persisted through the `LocalStore`
//! trait. `SqliteStore` is the durable backend; `MemoryStore` is volatile.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{LocalStore, OpenStore, StorageError, StorageResult};
