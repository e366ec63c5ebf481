// crates/interax-core/src/lib.rs
// ============================================================================
// Module: Interax Core
// Description: Shared data model, normalizer, and concurrency limiter.
// Purpose: Provide the foundational types and primitives every other
//          interax crate builds on.
// Dependencies: serde, serde_json, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! This crate holds the data model shared across the pipeline
//! (`model`), the item canonicalizer and pair/triple enumerator (`normalize`,
//! C1), the bounded-concurrency task admission primitive (`limiter`, C2),
//! severity's fixed total order (`severity`), wall-clock timestamps
//! (`time`), and the orchestrator's public error taxonomy (`error`).
//!
//! Invariants:
//! - `normalize::canonicalize` is idempotent and locale-independent (ASCII
//!   lowercasing only).
//! - [`model::PairKey`] is symmetric in its two inputs.
//! - [`limiter::ConcurrencyLimiter`] never admits more than its configured
//!   capacity concurrently.
//!
//! Security posture: this crate does not perform I/O; it has no untrusted
//! input surface beyond the item strings it canonicalizes, which are
//! treated as opaque text.

pub mod error;
pub mod limiter;
pub mod model;
pub mod normalize;
pub mod severity;
pub mod time;

pub use error::PipelineError;
pub use limiter::{ConcurrencyLimiter, LimiterError};
pub use model::{
    DenominatorMethod, EvidenceRecord, EvidenceStats, NormalizedItem, Origin, PairKey, PairReport,
    ProviderStatus, SingleReport, TripleReport,
};
pub use normalize::{canonicalize, enumerate_pairs, enumerate_triples, normalize_items, pair_key, NormalizeError};
pub use severity::Severity;
pub use time::Timestamp;
