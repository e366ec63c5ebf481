//! The store's error taxonomy, shaped after the teacher's
//! `SqliteStoreError`/`StoreError` split.

use thiserror::Error;

/// Errors raised by the SQLite-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem I/O failure opening or preparing the database file.
    #[error("store io error: {0}")]
    Io(String),
    /// The underlying `SQLite` engine reported an error.
    #[error("store db error: {0}")]
    Db(String),
    /// A stored row failed to deserialize.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// The on-disk schema version is newer or unrecognized.
    #[error("store schema version mismatch: {0}")]
    VersionMismatch(String),
    /// A value failed validation before being written.
    #[error("store invalid data: {0}")]
    Invalid(String),
}
