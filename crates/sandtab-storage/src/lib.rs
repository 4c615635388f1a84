//! Sandtab Storage Layer
//!
//! Key-value persistence for per-context credential stores.
//! Records live only as long as the context that owns them; nothing here is
//! expected to survive a restart.

mod database;
mod error;
mod memory;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// String-keyed storage shared by every session in the process.
///
/// Keys are owned by a single logical writer (one session id per key), so
/// implementations only need per-call atomicity.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}
