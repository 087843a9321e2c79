//! Key-value store abstractions.
//!
//! # Responsibility
//! - Define the string-keyed storage contract used for the points counter.
//! - Provide a durable file-backed store and an in-memory store.
//!
//! # Invariants
//! - A missing key is reported as `Ok(None)`, never as an error.
//! - `set` is durable before it returns; single-key atomicity only.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file_store;
mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;

pub type KvResult<T> = Result<T, KvError>;

/// Error for key-value store reads and writes.
#[derive(Debug)]
pub enum KvError {
    /// Filesystem access failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Persisted content is not a valid key-value document.
    InvalidData {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// In-memory content could not be encoded for persistence.
    Serialize(serde_json::Error),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "key-value store io failed at `{}`: {source}", path.display())
            }
            Self::InvalidData { path, source } => write!(
                f,
                "invalid key-value document at `{}`: {source}",
                path.display()
            ),
            Self::Serialize(err) => write!(f, "failed to encode key-value document: {err}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidData { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Persistent string-to-string storage.
pub trait KeyValueStore {
    /// Returns the stored value for `key`, or `None` when never set.
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    /// Stores `value` under `key`, replacing any prior value.
    fn set(&mut self, key: &str, value: &str) -> KvResult<()>;
}
