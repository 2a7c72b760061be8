//! Engine Error Types
//!
//! Every fallible engine operation returns a [`StoreError`]. The command
//! dispatcher is the recovery boundary: it converts each variant into a RESP
//! error reply, so no engine error ever takes down the process or a
//! connection.

use thiserror::Error;

/// Errors produced by the storage engine, registry, and persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A hash-field operation targeted a key holding a plain string
    /// (or vice versa). Mirrors the Redis WRONGTYPE error.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// SELECT or a per-database operation named a database that is not
    /// registered.
    #[error("ERR no such database '{0}'")]
    DbNotFound(String),

    /// CREATEDB on a name that is already registered.
    #[error("ERR database '{0}' already exists")]
    DbAlreadyExists(String),

    /// The registry is at its configured maximum database count.
    #[error("ERR maximum number of databases reached ({0})")]
    DbLimit(usize),

    /// LOADDB found no snapshot file for the requested database.
    #[error("ERR no snapshot for database '{0}'")]
    SnapshotNotFound(String),

    /// Database names must be UTF-8 and safe to use as a file name.
    #[error("ERR invalid database name")]
    InvalidDbName,

    /// A snapshot file failed structural validation while loading.
    #[error("ERR snapshot corrupt: {0}")]
    Corrupt(String),

    /// Underlying file I/O failure during save or load.
    #[error("ERR io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the engine.
pub type StoreResult<T> = Result<T, StoreError>;
