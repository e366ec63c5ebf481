// crates/interax-store-sqlite/src/lib.rs
// ============================================================================
// Module: Interax Store SQLite
// Description: Durable cache stores backed by SQLite WAL.
// Purpose: Persist item/pair/exposure cache entries and an append-only
//          usage log, grounded on the teacher's SqliteRunStateStore.
// Dependencies: interax-core, interax-providers, rusqlite, serde,
//               serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Three keyed caches — [`item`], [`pair`], [`exposure`] — plus the
//! append-only [`usage_log`], sharing one `SQLite` connection opened by
//! [`connection::open`]. Pair reads are scoped to a `calc_version` string;
//! rows from a different version are simply a different primary key and
//! so are invisible. Negative item-cache fields partially invalidate
//! after 24 hours; positive entries never expire on their own.
//!
//! Security posture: every stored payload is this crate's own
//! serialization of already-validated in-process types; nothing here
//! parses untrusted external bytes.

pub mod connection;
pub mod error;
pub mod exposure;
pub mod item;
pub mod pair;
pub mod usage_log;

pub use connection::{open, SqliteStoreConfig, SqliteStoreMode};
pub use error::StoreError;
pub use exposure::{ExposureEntry, ExposureStore};
pub use item::{ItemCacheEntry, ItemCacheRead, ItemStore};
pub use pair::PairStore;
pub use usage_log::{UsageLogEntry, UsageLogStore};
