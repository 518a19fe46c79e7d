//! Gazette Store: SQLite repository for newspapers, pages, articles and
//! keywords, with keyword and substring search.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
