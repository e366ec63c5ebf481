//! The item cache (§4.5): one row per normalized item, holding identifiers
//! from each upstream authority and a label-warnings payload, behind a
//! single `updated_at` timestamp that partially invalidates negative
//! fields after 24 hours.

use std::sync::{Arc, Mutex};

use interax_core::Timestamp;
use interax_providers::LabelWarningsResult;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Negative item fields older than this are reported as stale, requiring
/// a re-fetch for exactly that field.
const NEGATIVE_ENTRY_MAX_AGE_SECONDS: i64 = 24 * 3600;

/// The stored shape of an item's cache row. `None` in a field means the
/// upstream was asked and had nothing — a negative entry, not a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCacheEntry {
    /// RxNorm identifier, if found.
    pub rxnorm_id: Option<String>,
    /// Supplement-authority identifier, if found.
    pub supplement_id: Option<String>,
    /// Cached label-warnings payload, if found.
    pub label_warnings: Option<LabelWarningsResult>,
    /// When this row was last written.
    pub updated_at: Timestamp,
}

/// The result of reading the item cache: the stored entry (if any), plus
/// which negative fields are stale and need a re-fetch.
#[derive(Debug, Clone, Default)]
pub struct ItemCacheRead {
    /// The stored entry, `None` on a full miss.
    pub entry: Option<ItemCacheEntry>,
    /// Whether `rxnorm_id` is a stale negative entry.
    pub stale_rxnorm: bool,
    /// Whether `supplement_id` is a stale negative entry.
    pub stale_supplement: bool,
    /// Whether `label_warnings` is a stale negative entry.
    pub stale_label: bool,
}

/// The item cache store.
#[derive(Clone)]
pub struct ItemStore {
    connection: Arc<Mutex<Connection>>,
}

impl ItemStore {
    /// Wraps a shared connection as an item store.
    #[must_use]
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Reads the cached entry for `normalized`. `force_refresh` treats the
    /// row as a full miss without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or row corruption.
    pub fn get(&self, normalized: &str, force_refresh: bool, now: Timestamp) -> Result<ItemCacheRead, StoreError> {
        if force_refresh {
            return Ok(ItemCacheRead::default());
        }
        let connection = self.connection.lock().map_err(|_| StoreError::Db("item store mutex poisoned".to_string()))?;
        let row: Option<String> = connection
            .query_row("SELECT entry_json FROM items WHERE normalized = ?1", params![normalized], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let Some(row) = row else {
            return Ok(ItemCacheRead::default());
        };
        let entry: ItemCacheEntry = serde_json::from_str(&row).map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let negative_is_stale = entry.updated_at.is_older_than(NEGATIVE_ENTRY_MAX_AGE_SECONDS, now);
        let stale_rxnorm = entry.rxnorm_id.is_none() && negative_is_stale;
        let stale_supplement = entry.supplement_id.is_none() && negative_is_stale;
        let stale_label = entry.label_warnings.is_none() && negative_is_stale;
        Ok(ItemCacheRead { entry: Some(entry), stale_rxnorm, stale_supplement, stale_label })
    }

    /// Upserts the cache row for `normalized`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connection failure or serialization
    /// failure.
    pub fn put(&self, normalized: &str, entry: &ItemCacheEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let connection = self.connection.lock().map_err(|_| StoreError::Db("item store mutex poisoned".to_string()))?;
        connection
            .execute(
                "INSERT INTO items (normalized, entry_json) VALUES (?1, ?2)
                 ON CONFLICT(normalized) DO UPDATE SET entry_json = excluded.entry_json",
                params![normalized, payload],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use time::Duration;

    use super::*;
    use crate::connection::{open, SqliteStoreConfig, SqliteStoreMode};

    fn store() -> (tempfile::TempDir, ItemStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            SqliteStoreConfig { path: dir.path().join("store.sqlite3"), busy_timeout_ms: 1_000, journal_mode: SqliteStoreMode::Wal };
        let connection = open(&config).expect("open");
        (dir, ItemStore::new(Arc::new(Mutex::new(connection))))
    }

    #[test]
    fn miss_on_empty_store() {
        let (_dir, store) = store();
        let read = store.get("warfarin", false, Timestamp::now()).expect("get");
        assert!(read.entry.is_none());
    }

    #[test]
    fn force_refresh_reports_a_miss_even_when_a_row_exists() {
        let (_dir, store) = store();
        let entry = ItemCacheEntry { rxnorm_id: Some("123".to_string()), supplement_id: None, label_warnings: None, updated_at: Timestamp::now() };
        store.put("warfarin", &entry).expect("put");
        let read = store.get("warfarin", true, Timestamp::now()).expect("get");
        assert!(read.entry.is_none());
    }

    #[test]
    fn fresh_negative_entry_is_not_stale() {
        let (_dir, store) = store();
        let entry = ItemCacheEntry { rxnorm_id: None, supplement_id: None, label_warnings: None, updated_at: Timestamp::now() };
        store.put("ginkgo", &entry).expect("put");
        let read = store.get("ginkgo", false, Timestamp::now()).expect("get");
        assert!(!read.stale_rxnorm);
    }

    #[test]
    fn negative_entry_older_than_24h_is_stale() {
        let (_dir, store) = store();
        let then = Timestamp::now();
        let entry = ItemCacheEntry { rxnorm_id: None, supplement_id: None, label_warnings: None, updated_at: then };
        store.put("ginkgo", &entry).expect("put");
        let later = Timestamp::from_offset_date_time(then.as_offset_date_time() + Duration::hours(25));
        let read = store.get("ginkgo", false, later).expect("get");
        assert!(read.stale_rxnorm);
        assert!(read.stale_supplement);
        assert!(read.stale_label);
    }

    #[test]
    fn positive_entry_never_goes_stale() {
        let (_dir, store) = store();
        let then = Timestamp::now();
        let entry =
            ItemCacheEntry { rxnorm_id: Some("123".to_string()), supplement_id: None, label_warnings: None, updated_at: then };
        store.put("warfarin", &entry).expect("put");
        let much_later = Timestamp::from_offset_date_time(then.as_offset_date_time() + Duration::hours(1000));
        let read = store.get("warfarin", false, much_later).expect("get");
        assert!(!read.stale_rxnorm);
        assert!(read.stale_supplement);
    }
}
