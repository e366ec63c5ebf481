//! The pair-result cache (§4.5): keyed by `(pair_key, calc_version)`. A
//! row from a superseded `calc_version` is simply a different primary key
//! and so is invisible to reads scoped to the current version.

use std::sync::{Arc, Mutex};

use interax_core::{PairKey, PairReport};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;

/// The pair-result cache store.
#[derive(Clone)]
pub struct PairStore {
    connection: Arc<Mutex<Connection>>,
}

impl PairStore {
    /// Wraps a shared connection as a pair store.
    #[must_use]
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Reads the cached report for `(pair_key, calc_version)`.
    /// `force_refresh` reports a miss without reading the row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or row corruption.
    pub fn get(&self, pair_key: &PairKey, calc_version: &str, force_refresh: bool) -> Result<Option<PairReport>, StoreError> {
        if force_refresh {
            return Ok(None);
        }
        let connection = self.connection.lock().map_err(|_| StoreError::Db("pair store mutex poisoned".to_string()))?;
        let row: Option<String> = connection
            .query_row(
                "SELECT report_json FROM pairs WHERE pair_key = ?1 AND calc_version = ?2",
                params![pair_key.as_str(), calc_version],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        row.map(|payload| serde_json::from_str(&payload).map_err(|err| StoreError::Corrupt(err.to_string()))).transpose()
    }

    /// Upserts the cached report for `(pair_key, calc_version)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or serialization
    /// failure.
    pub fn put(&self, pair_key: &PairKey, calc_version: &str, report: &PairReport) -> Result<(), StoreError> {
        let payload = serde_json::to_string(report).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let connection = self.connection.lock().map_err(|_| StoreError::Db("pair store mutex poisoned".to_string()))?;
        connection
            .execute(
                "INSERT INTO pairs (pair_key, calc_version, report_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT(pair_key, calc_version) DO UPDATE SET report_json = excluded.report_json",
                params![pair_key.as_str(), calc_version, payload],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use interax_core::Severity;

    use super::*;
    use crate::connection::{open, SqliteStoreConfig, SqliteStoreMode};

    fn store() -> (tempfile::TempDir, PairStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            SqliteStoreConfig { path: dir.path().join("store.sqlite3"), busy_timeout_ms: 1_000, journal_mode: SqliteStoreMode::Wal };
        let connection = open(&config).expect("open");
        (dir, PairStore::new(Arc::new(Mutex::new(connection))))
    }

    fn report() -> PairReport {
        PairReport {
            a_original: "Warfarin".to_string(),
            b_original: "Aspirin".to_string(),
            severity: Severity::Moderate,
            confidence: 0.7,
            sources: Vec::new(),
            summary: "test".to_string(),
            key_notes: Vec::new(),
        }
    }

    #[test]
    fn a_different_calc_version_is_invisible() {
        let (_dir, store) = store();
        let key = PairKey::new("warfarin", "aspirin");
        store.put(&key, "v1", &report()).expect("put");
        assert!(store.get(&key, "v2", false).expect("get").is_none());
        assert!(store.get(&key, "v1", false).expect("get").is_some());
    }

    #[test]
    fn force_refresh_reports_a_miss() {
        let (_dir, store) = store();
        let key = PairKey::new("warfarin", "aspirin");
        store.put(&key, "v1", &report()).expect("put");
        assert!(store.get(&key, "v1", true).expect("get").is_none());
    }
}
