//! The weighted-vote consensus engine (§4.8): turns a merged set of
//! evidence records into a single consensus [`Severity`].

use std::collections::HashMap;

use interax_core::{EvidenceRecord, Severity};

/// Combined reliability weight at severe, used to gate the high-weight
/// sub-cases.
const SEVERE_WEIGHT_THRESHOLD: f64 = 1.5;

/// The fraction of severe weight a high-reliability moderate dissent must
/// exceed to force a demotion under rule (b).
const DEMOTION_MODERATE_SHARE: f64 = 0.8;

/// Computes the consensus severity for a merged set of evidence records.
///
/// Implements §4.8 exactly:
/// 1. No records: unknown (the "none" distinguishability rule is applied
///    by the orchestrator, which knows whether a primary source ran).
/// 2. Tally reliability weight per severity class.
/// 3. If any weight landed on severe:
///    a. a record with weight ≥ 0.8 voted severe: severe.
///    b. combined severe weight ≥ 1.5 and no high-reliability record
///       opposed it (voted non-severe, non-unknown): severe; if a
///       high-reliability record opposed it and moderate holds more than
///       80% of the severe weight: moderate; otherwise: severe.
///    c. a high-reliability record voted non-severe, non-unknown: demote
///       to moderate.
///    d. moderate holds any weight: demote to moderate.
///    e. otherwise: demote to moderate (an uncorroborated severe claim
///       from low-reliability sources alone never survives).
/// 4. Otherwise: the severity class among {moderate, mild, none, unknown}
///    with the greatest weight, ties broken in that listed order.
#[must_use]
pub fn consensus(records: &[EvidenceRecord]) -> Severity {
    if records.is_empty() {
        return Severity::Unknown;
    }
    let mut weights: HashMap<Severity, f64> = HashMap::new();
    for record in records {
        *weights.entry(record.severity).or_insert(0.0) += record.origin.reliability_weight();
    }
    let severe_weight = weights.get(&Severity::Severe).copied().unwrap_or(0.0);
    if severe_weight > 0.0 {
        return resolve_severe_tally(records, &weights, severe_weight);
    }
    let order = [Severity::Moderate, Severity::Mild, Severity::None, Severity::Unknown];
    let mut best = Severity::Unknown;
    let mut best_weight = -1.0;
    for candidate in order {
        let weight = weights.get(&candidate).copied().unwrap_or(0.0);
        if weight > best_weight {
            best_weight = weight;
            best = candidate;
        }
    }
    best
}

/// Resolves sub-cases (a)-(e) once at least some weight has landed on
/// severe.
fn resolve_severe_tally(records: &[EvidenceRecord], weights: &HashMap<Severity, f64>, severe_weight: f64) -> Severity {
    let high_reliability_voted_severe =
        records.iter().any(|record| record.severity == Severity::Severe && record.origin.is_high_reliability());
    if high_reliability_voted_severe {
        return Severity::Severe;
    }

    let high_reliability_opposed = high_reliability_dissent(records);
    let moderate_weight = weights.get(&Severity::Moderate).copied().unwrap_or(0.0);

    if severe_weight >= SEVERE_WEIGHT_THRESHOLD {
        if !high_reliability_opposed {
            return Severity::Severe;
        }
        if moderate_weight > DEMOTION_MODERATE_SHARE * severe_weight {
            return Severity::Moderate;
        }
        return Severity::Severe;
    }

    if high_reliability_opposed {
        return Severity::Moderate;
    }
    if moderate_weight > 0.0 {
        return Severity::Moderate;
    }
    // A severe claim backed only by low-reliability sources, with no
    // moderate corroboration either, doesn't survive unaided.
    Severity::Moderate
}

/// Whether a high-reliability record voted something other than severe or
/// unknown (an explicit dissent, as opposed to abstaining).
fn high_reliability_dissent(records: &[EvidenceRecord]) -> bool {
    records
        .iter()
        .any(|record| record.origin.is_high_reliability() && record.severity != Severity::Severe && record.severity != Severity::Unknown)
}

/// Lifts an unknown consensus to `none` when the merged set is empty but
/// at least one primary source completed without error — "we looked and
/// found nothing" is distinct from "we never looked" (§4.8).
#[must_use]
pub fn apply_none_rule(consensus_severity: Severity, merged_is_empty: bool, any_primary_succeeded: bool) -> Severity {
    if merged_is_empty && any_primary_succeeded && consensus_severity == Severity::Unknown {
        Severity::None
    } else {
        consensus_severity
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use interax_core::{Origin, Timestamp};

    use super::*;

    fn record(origin: Origin, severity: Severity) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence: origin.base_confidence(),
            summary: String::new(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    #[test]
    fn empty_records_yield_unknown() {
        assert_eq!(consensus(&[]), Severity::Unknown);
    }

    #[test]
    fn high_reliability_severe_vote_wins_outright() {
        let records = vec![record(Origin::RxnormInteractions, Severity::Severe)];
        assert_eq!(consensus(&records), Severity::Severe);
    }

    #[test]
    fn high_reliability_moderate_demotes_a_low_reliability_severe_claim() {
        let records =
            vec![record(Origin::PairAdverseEvents, Severity::Severe), record(Origin::LabelWarnings, Severity::Moderate)];
        assert_eq!(consensus(&records), Severity::Moderate);
    }

    #[test]
    fn lone_literature_severe_claim_cannot_stand_alone() {
        let records = vec![record(Origin::LiteratureAi, Severity::Severe)];
        assert_eq!(consensus(&records), Severity::Moderate);
    }

    #[test]
    fn heavy_low_reliability_severe_weight_without_opposition_stands() {
        let records = vec![
            record(Origin::PairAdverseEvents, Severity::Severe),
            record(Origin::SupplementInteractions, Severity::Severe),
            record(Origin::LiteratureAi, Severity::Severe),
        ];
        assert_eq!(consensus(&records), Severity::Severe);
    }

    #[test]
    fn non_severe_tally_picks_greatest_weight_with_order_tiebreak() {
        let records = vec![record(Origin::LiteratureAi, Severity::Mild), record(Origin::SupplementInteractions, Severity::Mild)];
        assert_eq!(consensus(&records), Severity::Mild);
    }

    #[test]
    fn none_rule_lifts_unknown_when_a_primary_looked_and_found_nothing() {
        assert_eq!(apply_none_rule(Severity::Unknown, true, true), Severity::None);
        assert_eq!(apply_none_rule(Severity::Unknown, true, false), Severity::Unknown);
    }
}

#[cfg(test)]
mod proptests {
    use interax_core::{Origin, Timestamp};
    use proptest::prelude::*;

    use super::*;

    const ORIGINS: [Origin; 6] = [
        Origin::RxnormInteractions,
        Origin::LabelWarnings,
        Origin::PairAdverseEvents,
        Origin::SupplementInteractions,
        Origin::LiteratureAi,
        Origin::SingleDrugAdverseEvents,
    ];

    fn origin_strategy() -> impl Strategy<Value = Origin> {
        (0..ORIGINS.len()).prop_map(|index| ORIGINS[index])
    }

    fn severity_strategy() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Unknown),
            Just(Severity::None),
            Just(Severity::Mild),
            Just(Severity::Moderate),
            Just(Severity::Severe),
        ]
    }

    fn record(origin: Origin, severity: Severity) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence: origin.base_confidence(),
            summary: String::new(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    proptest! {
        #[test]
        fn consensus_never_panics_over_arbitrary_records(
            votes in proptest::collection::vec((origin_strategy(), severity_strategy()), 0..8),
        ) {
            let records: Vec<EvidenceRecord> = votes.into_iter().map(|(origin, severity)| record(origin, severity)).collect();
            let _ = consensus(&records);
        }

        #[test]
        fn a_high_reliability_severe_vote_always_wins_outright(
            other_votes in proptest::collection::vec((origin_strategy(), severity_strategy()), 0..6),
        ) {
            let mut records: Vec<EvidenceRecord> =
                other_votes.into_iter().map(|(origin, severity)| record(origin, severity)).collect();
            records.push(record(Origin::RxnormInteractions, Severity::Severe));
            prop_assert_eq!(consensus(&records), Severity::Severe);
        }
    }
}
