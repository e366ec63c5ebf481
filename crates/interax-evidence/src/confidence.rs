//! The confidence engine (§4.9): per-record confidence seeding and the
//! aggregate weighted mean with its two guardrails.

use interax_core::{EvidenceRecord, EvidenceStats, Origin, Severity};

/// Confidence can never reach certainty; the aggregate is always clamped
/// below this value.
pub const EFFECTIVE_CAP: f64 = 0.95;

/// The seeded, stat-adjusted confidence for a single evidence record.
///
/// Starts from `origin.base_confidence()`, applies the additive,
/// exposure-aware adjustments, clamps to `[0, 1]`, then scales by 0.7
/// when the record's severity is unknown.
#[must_use]
pub fn per_record_confidence(origin: Origin, severity: Severity, stats: Option<&EvidenceStats>) -> f64 {
    let mut value = origin.base_confidence();
    if let Some(stats) = stats {
        if let Some(beneficiaries) = stats.beneficiaries {
            #[allow(clippy::cast_precision_loss, reason = "beneficiary counts stay well under f64's mantissa")]
            let bonus = ((beneficiaries as f64 + 1.0).log10() / 10.0).min(0.15);
            value += bonus;
        }
        if stats.event_rate.is_some() && stats.serious_event_rate.is_some() {
            value += 0.05;
        }
        if let Some(total) = stats.total_events {
            if total > 1000 {
                value += 0.05;
            } else if total > 100 {
                value += 0.02;
            } else if total < 10 {
                value -= 0.05;
            }
        }
    }
    value = value.clamp(0.0, 1.0);
    if severity == Severity::Unknown {
        value *= 0.7;
    }
    value.clamp(0.0, 1.0)
}

/// The number of primary-family providers that ran to completion without
/// error, regardless of whether they found anything.
#[must_use]
pub fn successful_primary_count(attempts: &[(Origin, bool)]) -> usize {
    attempts.iter().filter(|(origin, succeeded)| origin.is_primary() && *succeeded).count()
}

/// Computes the aggregate confidence for a pair from its merged records.
///
/// `primary_success_count` is the number of primary-family providers that
/// completed without error (§4.9's two guardrails both key off this
/// count, not off how many records survived merging).
///
/// `rxnorm_interactions_failed` is a third, stricter guardrail: confidence
/// is forced to zero whenever `rxnorm_interactions` was attempted and
/// came back an error, even if another primary provider succeeded. This
/// is `false`, vacuously, whenever `rxnorm_interactions` was never
/// attempted (no RxCUI resolved for one or both items).
#[must_use]
pub fn aggregate_confidence(merged: &[EvidenceRecord], primary_success_count: usize, rxnorm_interactions_failed: bool) -> f64 {
    if rxnorm_interactions_failed || primary_success_count == 0 {
        return 0.0;
    }
    if merged.is_empty() {
        return baseline_for_count(primary_success_count);
    }
    let weight_sum: f64 = merged.iter().map(|record| record.origin.base_confidence()).sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted_sum: f64 = merged.iter().map(|record| record.confidence * record.origin.base_confidence()).sum();
    (weighted_sum / weight_sum).clamp(0.0, EFFECTIVE_CAP)
}

/// The baseline-by-count rule applied when at least one primary source ran
/// but the merged set came back empty.
fn baseline_for_count(primary_success_count: usize) -> f64 {
    match primary_success_count {
        1 => 0.30,
        2 => 0.50,
        _ => 0.70,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use interax_core::Timestamp;

    use super::*;

    fn record(origin: Origin, severity: Severity, confidence: f64) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence,
            summary: String::new(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    #[test]
    fn no_successful_primary_caps_at_zero() {
        let merged = vec![record(Origin::LabelWarnings, Severity::Moderate, 0.8)];
        assert_eq!(aggregate_confidence(&merged, 0, false), 0.0);
    }

    #[test]
    fn empty_merge_with_one_primary_uses_baseline() {
        assert_eq!(aggregate_confidence(&[], 1, false), 0.30);
        assert_eq!(aggregate_confidence(&[], 2, false), 0.50);
        assert_eq!(aggregate_confidence(&[], 3, false), 0.70);
    }

    #[test]
    fn aggregate_never_reaches_one() {
        let merged = vec![record(Origin::RxnormInteractions, Severity::Severe, 1.0)];
        assert!(aggregate_confidence(&merged, 1, false) <= EFFECTIVE_CAP);
    }

    #[test]
    fn rxnorm_interactions_failure_caps_at_zero_even_with_another_successful_primary() {
        let merged = vec![record(Origin::PairAdverseEvents, Severity::Moderate, 0.8)];
        assert_eq!(aggregate_confidence(&merged, 1, true), 0.0);
    }

    #[test]
    fn unknown_severity_scales_down_per_record_confidence() {
        let known = per_record_confidence(Origin::RxnormInteractions, Severity::Severe, None);
        let unknown = per_record_confidence(Origin::RxnormInteractions, Severity::Unknown, None);
        assert!(unknown < known);
    }

    #[test]
    fn exposure_bonus_is_capped_at_0_15() {
        let stats = EvidenceStats {
            beneficiaries: Some(10_000_000),
            ..Default::default()
        };
        let base = Origin::PairAdverseEvents.base_confidence();
        let adjusted = per_record_confidence(Origin::PairAdverseEvents, Severity::Mild, Some(&stats));
        assert!(adjusted <= base + 0.15 + 1e-9);
    }
}
