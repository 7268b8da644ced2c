//! Storage implementations for the post ledger and subscriber registry.
//!
//! Available backends:
//! - `SqliteStore` - SQLite via sqlx, used in production
//! - `MemoryStore` - In-memory storage for tests

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
