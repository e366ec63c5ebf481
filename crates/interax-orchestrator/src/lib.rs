// crates/interax-orchestrator/src/lib.rs
// ============================================================================
// Module: Interax Orchestrator
// Description: The six-step analyze pipeline that turns a list of drug/
//   supplement names into single, pair, and triple interaction reports.
// Purpose: Ties together normalization, provider adapters, caching, and
//   evidence reduction into one `Pipeline::analyze` call.
// Dependencies: interax-config, interax-core, interax-evidence, interax-http,
//   interax-providers, interax-store-sqlite, reqwest, rusqlite, serde,
//   serde_json, thiserror, tokio, tracing.
// ============================================================================

//! ## Overview
//!
//! [`Pipeline::analyze`] runs six steps per request:
//!
//! 1. normalize every requested item and reject out-of-bound counts;
//! 2. resolve each item's identifiers, label warnings, and exposure
//!    estimate, concurrently, against the item cache;
//! 3. compute each unordered pair's merged, consensus-scored report,
//!    concurrently, against the pair cache;
//! 4. compute each item's standalone report from its own evidence;
//! 5. re-derive each unordered triple's report from its three constituent
//!    pairs, without any new provider calls;
//! 6. assemble the response and append a usage-log entry.
//!
//! Provider call failures never fail a request: they degrade the affected
//! evidence to absent and, in debug mode, appear in the response's `debug`
//! trace. Only normalization failures and cache *read* failures surface as
//! [`interax_core::PipelineError`]; cache *write* failures are logged and
//! swallowed, mirroring the usage log's own write-failure handling.

#![deny(missing_docs)]

pub mod pipeline;
pub mod request;
pub mod response;
pub mod summary;

pub use interax_core::PipelineError;
pub use pipeline::Pipeline;
pub use request::{AnalyzeOptions, AnalyzeRequest};
pub use response::{AnalyzeResponse, AnalyzeResults, CacheStats, ProviderDebugEntry, ResponseMeta, TimingMeta};
