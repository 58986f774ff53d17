// Database module
// Dual store: SQLite for the authoritative product catalog, LanceDB for product vectors

pub mod lancedb;
pub mod sqlite;

pub use sqlite::*;
