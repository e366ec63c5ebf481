//! The append-only usage log (ambient addition, §4.5): one row per
//! completed request. Write failures are swallowed — the log is an
//! observability aid, never load-bearing for a response.

use std::sync::{Arc, Mutex};

use interax_core::Timestamp;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

/// A single usage-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Opaque request identifier.
    pub id: String,
    /// When the request was recorded.
    pub created_at: Timestamp,
    /// The requested items' original spellings.
    pub items: Vec<String>,
    /// A small JSON summary of the response (severities, counts).
    pub summary: serde_json::Value,
    /// Total request latency, in milliseconds.
    pub latency_ms: u64,
    /// A small JSON summary of cache hit/miss counts.
    pub cache_hits: serde_json::Value,
}

/// The usage log store.
#[derive(Clone)]
pub struct UsageLogStore {
    connection: Arc<Mutex<Connection>>,
}

impl UsageLogStore {
    /// Wraps a shared connection as a usage log store.
    #[must_use]
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Appends `entry`, logging and swallowing any failure rather than
    /// returning it — the log never fails a request.
    pub fn append(&self, entry: &UsageLogEntry) {
        if let Err(err) = self.try_append(entry) {
            tracing::warn!(error = %err, request_id = %entry.id, "usage log write failed, discarding");
        }
    }

    fn try_append(&self, entry: &UsageLogEntry) -> Result<(), String> {
        let created_at_json = serde_json::to_string(&entry.created_at).map_err(|err| err.to_string())?;
        let items_json = serde_json::to_string(&entry.items).map_err(|err| err.to_string())?;
        let summary_json = serde_json::to_string(&entry.summary).map_err(|err| err.to_string())?;
        let cache_hits_json = serde_json::to_string(&entry.cache_hits).map_err(|err| err.to_string())?;
        let latency_ms = i64::try_from(entry.latency_ms).unwrap_or(i64::MAX);
        let connection = self.connection.lock().map_err(|_| "usage log mutex poisoned".to_string())?;
        connection
            .execute(
                "INSERT INTO usage_log (id, created_at_json, items_json, summary_json, latency_ms, cache_hits_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![entry.id, created_at_json, items_json, summary_json, latency_ms, cache_hits_json],
            )
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;
    use crate::connection::{open, SqliteStoreConfig, SqliteStoreMode};

    fn store() -> (tempfile::TempDir, UsageLogStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            SqliteStoreConfig { path: dir.path().join("store.sqlite3"), busy_timeout_ms: 1_000, journal_mode: SqliteStoreMode::Wal };
        let connection = open(&config).expect("open");
        (dir, UsageLogStore::new(Arc::new(Mutex::new(connection))))
    }

    fn entry(id: &str) -> UsageLogEntry {
        UsageLogEntry {
            id: id.to_string(),
            created_at: Timestamp::now(),
            items: vec!["warfarin".to_string(), "aspirin".to_string()],
            summary: serde_json::json!({"maxSeverity": "moderate"}),
            latency_ms: 120,
            cache_hits: serde_json::json!({"medLookupHits": 1}),
        }
    }

    #[test]
    fn append_never_panics_on_success() {
        let (_dir, store) = store();
        store.append(&entry("req-1"));
    }

    #[test]
    fn duplicate_id_failure_is_swallowed_not_propagated() {
        let (_dir, store) = store();
        store.append(&entry("req-1"));
        // Primary-key collision: the second append fails internally but
        // `append` has no error channel to surface it through.
        store.append(&entry("req-1"));
    }
}
