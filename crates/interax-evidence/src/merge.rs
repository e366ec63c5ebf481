//! The merger (C7, §4.7): reduces possibly-repeated evidence records down
//! to at most one record per [`Origin`].

use std::collections::BTreeMap;

use interax_core::{EvidenceRecord, EvidenceStats, Origin, Timestamp};

/// Groups `records` by origin and reduces each group to a single record.
///
/// Within a group: severity is the max, confidence is the arithmetic
/// mean, details and stats are merged key-wise (later records win ties),
/// citations are unioned, the summary is the longest one present, and
/// `observed_at` is the most recent.
#[must_use]
pub fn merge(records: Vec<EvidenceRecord>) -> Vec<EvidenceRecord> {
    let mut groups: BTreeMap<Origin, Vec<EvidenceRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.origin).or_default().push(record);
    }
    groups.into_values().map(merge_group).collect()
}

/// Reduces one origin's group of records down to a single record.
#[allow(clippy::expect_used, reason = "called only with a non-empty group built from `merge`'s own grouping")]
fn merge_group(group: Vec<EvidenceRecord>) -> EvidenceRecord {
    let origin = group.first().expect("merge only ever builds non-empty groups").origin;
    let severity = group.iter().map(|record| record.severity).max().unwrap_or(interax_core::Severity::Unknown);
    #[allow(clippy::cast_precision_loss, reason = "evidence groups stay small")]
    let confidence = group.iter().map(|record| record.confidence).sum::<f64>() / group.len() as f64;

    let mut details = BTreeMap::new();
    let mut citations = std::collections::BTreeSet::new();
    for record in &group {
        details.extend(record.details.clone());
        citations.extend(record.citations.iter().cloned());
    }
    let summary = group.iter().map(|record| record.summary.clone()).max_by_key(String::len).unwrap_or_default();
    let observed_at = group.iter().map(|record| record.observed_at).max().unwrap_or_else(Timestamp::now);
    let stats = merge_stats(&group);

    EvidenceRecord { origin, severity, confidence, summary, details, citations, stats, observed_at }
}

/// Key-wise union of stats across a group: each field takes the last
/// present value among the group's records.
fn merge_stats(group: &[EvidenceRecord]) -> Option<EvidenceStats> {
    let mut merged = EvidenceStats::default();
    let mut any = false;
    for record in group {
        let Some(stats) = &record.stats else { continue };
        any = true;
        if stats.total_events.is_some() {
            merged.total_events = stats.total_events;
        }
        if stats.serious_events.is_some() {
            merged.serious_events = stats.serious_events;
        }
        if stats.beneficiaries.is_some() {
            merged.beneficiaries = stats.beneficiaries;
        }
        if stats.event_rate.is_some() {
            merged.event_rate = stats.event_rate;
        }
        if stats.serious_event_rate.is_some() {
            merged.serious_event_rate = stats.serious_event_rate;
        }
        if stats.denominator_method.is_some() {
            merged.denominator_method = stats.denominator_method;
        }
    }
    any.then_some(merged)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use interax_core::Severity;

    use super::*;

    fn record(origin: Origin, severity: Severity, confidence: f64, summary: &str) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence,
            summary: summary.to_string(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    #[test]
    fn one_record_per_origin_after_merge() {
        let records = vec![
            record(Origin::RxnormInteractions, Severity::Severe, 0.9, "a"),
            record(Origin::RxnormInteractions, Severity::Moderate, 0.5, "bb"),
            record(Origin::LabelWarnings, Severity::Mild, 0.7, "c"),
        ];
        let merged = merge(records);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn severity_takes_the_group_maximum() {
        let records = vec![
            record(Origin::LabelWarnings, Severity::Mild, 0.7, "a"),
            record(Origin::LabelWarnings, Severity::Severe, 0.9, "bb"),
        ];
        let merged = merge(records);
        assert_eq!(merged[0].severity, Severity::Severe);
    }

    #[test]
    fn confidence_is_the_group_mean() {
        let records =
            vec![record(Origin::LabelWarnings, Severity::Mild, 0.4, "a"), record(Origin::LabelWarnings, Severity::Mild, 0.8, "bb")];
        let merged = merge(records);
        assert!((merged[0].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn summary_prefers_the_longest() {
        let records = vec![
            record(Origin::LabelWarnings, Severity::Mild, 0.4, "short"),
            record(Origin::LabelWarnings, Severity::Mild, 0.4, "a much longer summary"),
        ];
        let merged = merge(records);
        assert_eq!(merged[0].summary, "a much longer summary");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge(Vec::new()).is_empty());
    }
}
