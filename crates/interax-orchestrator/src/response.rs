//! The response shape returned by [`crate::Pipeline::analyze`] (§6).

use interax_core::{NormalizedItem, PairReport, SingleReport, TripleReport};
use serde::{Deserialize, Serialize};

/// Cache hit/miss counters for one completed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Item-cache field hits (rxnorm, supplement, and label fields each
    /// count separately).
    pub item_hits: u64,
    /// Item-cache field misses.
    pub item_misses: u64,
    /// Pair-cache hits.
    pub pair_hits: u64,
    /// Pair-cache misses.
    pub pair_misses: u64,
    /// Exposure-cache hits.
    pub exposure_hits: u64,
    /// Exposure-cache misses.
    pub exposure_misses: u64,
}

/// Wall-clock timing breakdown for one completed request, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingMeta {
    /// Total request latency.
    pub total_ms: u64,
    /// Item phase latency.
    pub item_phase_ms: u64,
    /// Pair phase latency.
    pub pair_phase_ms: u64,
    /// Single phase latency.
    pub single_phase_ms: u64,
    /// Triple phase latency.
    pub triple_phase_ms: u64,
}

/// Request-level metadata accompanying the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// The `calc_version` pair results were computed (or read) under.
    pub calc_version: String,
    /// Cache hit/miss counters.
    pub cache_stats: CacheStats,
    /// Wall-clock timing breakdown.
    pub timing: TimingMeta,
}

/// The three result collections, keyed by arity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResults {
    /// One report per requested item.
    pub singles: Vec<SingleReport>,
    /// One report per unordered pair of requested items.
    pub pairs: Vec<PairReport>,
    /// One report per unordered triple of requested items.
    pub triples: Vec<TripleReport>,
}

/// A single provider attempt entry in the debug-mode trace (§4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDebugEntry {
    /// First item involved, original spelling.
    pub item_a: String,
    /// Second item involved, original spelling; absent for single-item
    /// calls.
    pub item_b: Option<String>,
    /// The provider family name, e.g. `"rxnorm_interactions"`.
    pub provider: String,
    /// Whether the call was attempted, succeeded, cached, and how long it
    /// took.
    pub status: interax_core::ProviderStatus,
}

/// The complete response for an analyze request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// The normalized form of every requested item.
    pub items: Vec<NormalizedItem>,
    /// The three result collections.
    pub results: AnalyzeResults,
    /// Request-level metadata.
    pub meta: ResponseMeta,
    /// Present only when debug mode was enabled for this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Vec<ProviderDebugEntry>>,
}
