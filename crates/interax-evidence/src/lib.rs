// crates/interax-evidence/src/lib.rs
// ============================================================================
// Module: Interax Evidence
// Description: Standardizers, merger, consensus engine, confidence engine.
// Purpose: Turn raw provider results into merged, consensus-scored,
//          confidence-scored evidence ready for report assembly.
// Dependencies: interax-core, interax-providers, serde_json
// ============================================================================

//! ## Overview
//! Four stages, applied in order by the orchestrator: [`standardize`] (C6,
//! one function per provider family), [`merge`] (C7, at most one record
//! per origin), [`consensus`] (C8, the weighted-vote severity decision),
//! and [`confidence`] (C9, the aggregate confidence score).
//!
//! Invariants:
//! - A lone severe vote from a low-reliability origin never survives
//!   consensus unaided (§4.8).
//! - Aggregate confidence never reaches 1.0; see
//!   [`confidence::EFFECTIVE_CAP`].

pub mod confidence;
pub mod consensus;
pub mod merge;
pub mod standardize;

pub use confidence::{aggregate_confidence, per_record_confidence, successful_primary_count, EFFECTIVE_CAP};
pub use consensus::{apply_none_rule, consensus};
pub use merge::merge;
pub use standardize::{
    adverse_event_stats, derive_adverse_event_severity, standardize_adverse_events, standardize_label_warnings,
    standardize_literature_ai, standardize_rxnorm_interaction, standardize_supplement_interactions,
};
