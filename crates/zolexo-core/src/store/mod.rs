//! Local key-value storage.
//!
//! The session token lives in a small string-keyed store that survives
//! restarts. Two backends are provided:
//! - `FileStore`: a JSON object persisted to a single file
//! - `MemoryStore`: a process-local map, used in tests

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string-keyed storage.
///
/// `clear` wipes every key, not just the ones this crate wrote.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
