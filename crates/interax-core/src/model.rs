//! Core data model shared by every stage of the pipeline: normalized items,
//! evidence records, and the three report shapes returned to callers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::time::Timestamp;

/// An item after canonicalization, paired with the caller's original
/// spelling.
///
/// `normalized` is idempotent under the canonicalizer: two items sharing
/// `original` after canonicalization share a cache partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// Trimmed, lowercased, whitespace-collapsed form used for caching and
    /// matching.
    pub normalized: String,
    /// The caller's original spelling, preserved for display.
    pub original: String,
}

/// The order-insensitive identifier of a pair of canonical values.
///
/// `PairKey::new(a, b) == PairKey::new(b, a)` and the derived string is
/// stable across processes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    /// The fixed separator joining the two canonical values.
    const SEPARATOR: &'static str = "::";

    /// Builds a pair key from two canonical values, ordering them
    /// lexicographically so the result is symmetric in its arguments.
    #[must_use]
    pub fn new(canonical_a: &str, canonical_b: &str) -> Self {
        let (first, second) = if canonical_a <= canonical_b {
            (canonical_a, canonical_b)
        } else {
            (canonical_b, canonical_a)
        };
        Self(format!("{first}{}{second}", Self::SEPARATOR))
    }

    /// Returns the key as a plain string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The logical source family of an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// RxNorm drug-drug interaction graph.
    RxnormInteractions,
    /// Adverse-event reports for a drug pair.
    PairAdverseEvents,
    /// Supplement-supplement or supplement-drug interaction data.
    SupplementInteractions,
    /// FDA structured product label warnings.
    LabelWarnings,
    /// AI-synthesized literature evidence.
    LiteratureAi,
    /// Adverse-event reports for a single drug.
    SingleDrugAdverseEvents,
}

impl Origin {
    /// The reliability weight used by the consensus engine (§4.8). Origins
    /// with no vote in consensus (`LabelWarnings` votes via its own weight,
    /// `SingleDrugAdverseEvents` never appears in pair consensus) still
    /// report a weight so callers have one table to consult.
    #[must_use]
    pub fn reliability_weight(self) -> f64 {
        match self {
            Self::RxnormInteractions => 1.0,
            Self::LabelWarnings => 0.9,
            Self::PairAdverseEvents => 0.7,
            Self::SupplementInteractions => 0.6,
            Self::LiteratureAi => 0.5,
            Self::SingleDrugAdverseEvents => 0.7,
        }
    }

    /// Whether this origin counts as high-reliability (weight ≥ 0.8).
    #[must_use]
    pub fn is_high_reliability(self) -> bool {
        self.reliability_weight() >= 0.8
    }

    /// Whether this origin is a primary source: one that directly tests
    /// for an interaction between the pair. Label warnings and literature
    /// are secondary.
    #[must_use]
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            Self::RxnormInteractions | Self::PairAdverseEvents | Self::SupplementInteractions
        )
    }

    /// The base confidence seeded for a fresh evidence record from this
    /// origin, before any aggregate adjustment (§4.9).
    #[must_use]
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::RxnormInteractions => 0.85,
            Self::LabelWarnings => 0.80,
            Self::SupplementInteractions => 0.70,
            Self::PairAdverseEvents | Self::SingleDrugAdverseEvents => 0.65,
            Self::LiteratureAi => 0.60,
        }
    }
}

/// How an adverse-event exposure denominator was derived, recorded when an
/// exposure value is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorMethod {
    /// The minimum of the two items' individual exposure estimates.
    MinOfPair,
    /// The first item's exposure estimate alone.
    SingleDrugA,
    /// The second item's exposure estimate alone.
    SingleDrugB,
}

/// Derived counts and rates attached to adverse-event evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceStats {
    /// Total adverse-event reports observed.
    pub total_events: Option<u64>,
    /// Reports classified as serious.
    pub serious_events: Option<u64>,
    /// Estimated exposed-beneficiary count, when known.
    pub beneficiaries: Option<u64>,
    /// `total_events / beneficiaries`, present only alongside both inputs.
    pub event_rate: Option<f64>,
    /// `serious_events / beneficiaries`, present only alongside both
    /// inputs.
    pub serious_event_rate: Option<f64>,
    /// How the exposure denominator was derived, when known.
    pub denominator_method: Option<DenominatorMethod>,
}

/// The uniform shape produced by standardizers (§4.6) and consumed by the
/// merger, consensus engine, and confidence engine.
///
/// Invariant: a lone `severity == Severe` record whose `origin` is
/// `LiteratureAi` must never be the sole record backing a pair's consensus
/// decision; this is enforced structurally by the consensus engine, not by
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// The source family this record came from.
    pub origin: Origin,
    /// The severity this record asserts.
    pub severity: Severity,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Short human-readable sentence.
    pub summary: String,
    /// Free-form provider-specific facts.
    pub details: BTreeMap<String, serde_json::Value>,
    /// External references.
    pub citations: BTreeSet<String>,
    /// Counts, rates, and denominator provenance, when applicable.
    pub stats: Option<EvidenceStats>,
    /// When this record was produced.
    pub observed_at: Timestamp,
}

/// Per-provider attempt trace surfaced in debug mode (§4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Whether the provider was attempted at all (some providers are
    /// skipped cleanly when a prerequisite identifier is absent).
    pub attempted: bool,
    /// See §4.10: semantics differ by provider family. For interaction
    /// providers, a normalized no-interaction result is still `ok = true`;
    /// for lookup providers, an absent identifier is `ok = false`.
    pub ok: bool,
    /// Wall-clock duration of the attempt.
    pub elapsed_ms: u64,
    /// Whether the value was served from cache.
    pub cached: bool,
    /// Sanitized error string, if any; never contains credentials or
    /// environment-derived secrets.
    pub error: Option<String>,
}

/// The merged, consensus-scored, confidence-scored report for a single
/// unordered pair of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    /// The first item's original spelling.
    pub a_original: String,
    /// The second item's original spelling.
    pub b_original: String,
    /// Consensus severity.
    pub severity: Severity,
    /// Aggregate confidence in `[0, 0.95]`.
    pub confidence: f64,
    /// Merged evidence, at most one record per origin.
    pub sources: Vec<EvidenceRecord>,
    /// Human-readable summary (§7's three-case text).
    pub summary: String,
    /// At most 3 short highlights drawn from the merged sources.
    pub key_notes: Vec<String>,
}

/// The report for a single item, combining its cached label warning with a
/// non-blocking single-drug adverse-event fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleReport {
    /// Canonical form of the item.
    pub normalized: String,
    /// Caller's original spelling.
    pub original: String,
    /// Severity derived from this item's own evidence.
    pub severity: Severity,
    /// Aggregate confidence in `[0, 0.95]`.
    pub confidence: f64,
    /// Merged evidence for this item alone.
    pub sources: Vec<EvidenceRecord>,
    /// Human-readable summary.
    pub summary: String,
}

/// The report for an unordered triple, re-derived from its three
/// constituent pairs without any new provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleReport {
    /// First item's original spelling.
    pub a_original: String,
    /// Second item's original spelling.
    pub b_original: String,
    /// Third item's original spelling.
    pub c_original: String,
    /// Consensus severity over the re-merged union of sources.
    pub severity: Severity,
    /// Aggregate confidence in `[0, 0.95]`.
    pub confidence: f64,
    /// Re-merged union of the three pairs' sources.
    pub sources: Vec<EvidenceRecord>,
    /// Human-readable summary.
    pub summary: String,
    /// At most 3 short highlights.
    pub key_notes: Vec<String>,
}
