//! Error types for key/value persistence.

use thiserror::Error;

/// Errors raised by [`KvStore`](crate::KvStore) backends and
/// [`TabStore`](crate::TabStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite backend failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure (database directory, legacy file import).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refuses writes.
    #[error("store is read-only")]
    ReadOnly,
}

pub type StoreResult<T> = Result<T, StoreError>;
