//! The exposure cache (§4.5): keyed by `normalized`, holding an estimated
//! beneficiary count and where it came from.

use std::sync::{Arc, Mutex};

use interax_core::Timestamp;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A cached exposure estimate for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureEntry {
    /// Estimated exposed-beneficiary count.
    pub beneficiaries: u64,
    /// Where the estimate came from.
    pub source: String,
    /// When this estimate was written.
    pub updated_at: Timestamp,
}

/// The exposure cache store.
#[derive(Clone)]
pub struct ExposureStore {
    connection: Arc<Mutex<Connection>>,
}

impl ExposureStore {
    /// Wraps a shared connection as an exposure store.
    #[must_use]
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Reads the cached exposure estimate for `normalized`. `force_refresh`
    /// reports a miss without reading the row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or row corruption.
    pub fn get(&self, normalized: &str, force_refresh: bool) -> Result<Option<ExposureEntry>, StoreError> {
        if force_refresh {
            return Ok(None);
        }
        let connection = self.connection.lock().map_err(|_| StoreError::Db("exposure store mutex poisoned".to_string()))?;
        let row: Option<String> = connection
            .query_row("SELECT entry_json FROM exposures WHERE normalized = ?1", params![normalized], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        row.map(|payload| serde_json::from_str(&payload).map_err(|err| StoreError::Corrupt(err.to_string()))).transpose()
    }

    /// Upserts the cached exposure estimate for `normalized`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or serialization
    /// failure.
    pub fn put(&self, normalized: &str, entry: &ExposureEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let connection = self.connection.lock().map_err(|_| StoreError::Db("exposure store mutex poisoned".to_string()))?;
        connection
            .execute(
                "INSERT INTO exposures (normalized, entry_json) VALUES (?1, ?2)
                 ON CONFLICT(normalized) DO UPDATE SET entry_json = excluded.entry_json",
                params![normalized, payload],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }
}
