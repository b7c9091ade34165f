//! Key/value storage backends and the typed accessor built on top of them.
//!
//! Backends may reject any read or write at any time (quota, permissions,
//! a corrupt file). The [`LocalStore`] accessor absorbs those failures and
//! reports them as `false`/`None` so callers degrade instead of failing.

mod file;
mod local;
mod memory;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use local::{LocalStore, TODOS_KEY};
pub use memory::MemoryStore;

/// Errors raised by a key/value backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Corrupt store file {}: {}", .0.display(), .1)]
    Corrupt(PathBuf, String),
}

/// String key/value storage with enumerable keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
