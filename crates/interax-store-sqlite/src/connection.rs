//! Connection setup: secure defaults, pragmas, and schema initialization.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Deserialize;

use crate::error::StoreError;

/// Schema version for this store's tables.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout, in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// `SQLite` journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended, and the default here).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value for this mode.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for opening the store's `SQLite` database.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Opens a connection with WAL mode, the configured busy timeout, and the
/// four tables this crate owns (`items`, `pairs`, `exposures`, `usage_log`).
///
/// # Errors
///
/// Returns [`StoreError`] when the parent directory cannot be created, the
/// connection cannot be opened, or the schema cannot be initialized.
pub fn open(config: &SqliteStoreConfig) -> Result<Connection, StoreError> {
    ensure_parent_dir(&config.path)?;
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| StoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    initialize_schema(&connection)?;
    Ok(connection)
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))
}

fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), StoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| StoreError::Db(err.to_string()))
}

fn initialize_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    let version: Option<i64> = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| StoreError::Db(err.to_string()))?;
    match version {
        None => {
            connection
                .execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| StoreError::Db(err.to_string()))?;
            connection
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS items (
                        normalized TEXT PRIMARY KEY,
                        entry_json BLOB NOT NULL
                    );
                    CREATE TABLE IF NOT EXISTS pairs (
                        pair_key TEXT NOT NULL,
                        calc_version TEXT NOT NULL,
                        report_json BLOB NOT NULL,
                        PRIMARY KEY (pair_key, calc_version)
                    );
                    CREATE TABLE IF NOT EXISTS exposures (
                        normalized TEXT PRIMARY KEY,
                        entry_json BLOB NOT NULL
                    );
                    CREATE TABLE IF NOT EXISTS usage_log (
                        id TEXT PRIMARY KEY,
                        created_at_json TEXT NOT NULL,
                        items_json BLOB NOT NULL,
                        summary_json BLOB NOT NULL,
                        latency_ms INTEGER NOT NULL,
                        cache_hits_json BLOB NOT NULL
                    );",
                )
                .map_err(|err| StoreError::Db(err.to_string()))?;
            Ok(())
        }
        Some(value) if value == SCHEMA_VERSION => Ok(()),
        Some(value) => Err(StoreError::VersionMismatch(format!("unsupported schema version: {value}"))),
    }
}
