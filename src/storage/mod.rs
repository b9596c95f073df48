mod bookmarks;
mod kv;
mod schema;
mod types;

pub use bookmarks::{Bookmarks, BOOKMARKS_KEY};
pub use kv::{KeyValueStore, MemoryStore};
pub use schema::Database;
pub use types::DatabaseError;
