//! Human-readable summary and key-notes assembly (§7's three-case rule).

use std::cmp::Ordering;

use interax_core::{EvidenceRecord, Origin, Severity};

/// Maximum key notes surfaced per pair or triple report.
const MAX_KEY_NOTES: usize = 3;

/// Maximum characters kept from a source's summary when used as a key note.
const KEY_NOTE_MAX_CHARS: usize = 140;

/// Builds the three-case summary text (§7):
/// - a merged source drove the consensus severity: that source's summary.
/// - no sources, but at least one primary-family call ran ok: "no
///   significant interactions found".
/// - no primary-family call ran ok: "limited evidence available".
#[must_use]
pub fn build_summary(merged: &[EvidenceRecord], consensus_severity: Severity, any_primary_succeeded: bool) -> String {
    if let Some(record) = driving_record(merged, consensus_severity) {
        return record.summary.clone();
    }
    if any_primary_succeeded {
        "no significant interactions found".to_string()
    } else {
        "limited evidence available".to_string()
    }
}

/// Finds the merged record that best explains `consensus_severity`: the
/// highest-reliability record voting that severity, falling back to the
/// highest-confidence record of any severity when none matches exactly.
fn driving_record(merged: &[EvidenceRecord], consensus_severity: Severity) -> Option<&EvidenceRecord> {
    merged
        .iter()
        .filter(|record| record.severity == consensus_severity)
        .max_by(|a, b| compare_f64(a.origin.reliability_weight(), b.origin.reliability_weight()))
        .or_else(|| merged.iter().max_by(|a, b| compare_f64(a.confidence, b.confidence)))
}

/// Up to [`MAX_KEY_NOTES`] short highlights, one per merged source, ordered
/// by reliability weight.
#[must_use]
pub fn build_key_notes(merged: &[EvidenceRecord]) -> Vec<String> {
    let mut ranked: Vec<&EvidenceRecord> = merged.iter().collect();
    ranked.sort_by(|a, b| compare_f64(b.origin.reliability_weight(), a.origin.reliability_weight()));
    ranked.into_iter().take(MAX_KEY_NOTES).map(|record| format!("{}: {}", origin_label(record.origin), truncate(&record.summary))).collect()
}

/// Stable, non-`Debug` label for an [`Origin`], used in human-readable text.
fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::RxnormInteractions => "rxnorm_interactions",
        Origin::PairAdverseEvents => "pair_adverse_events",
        Origin::SupplementInteractions => "supplement_interactions",
        Origin::LabelWarnings => "label_warnings",
        Origin::LiteratureAi => "literature_ai",
        Origin::SingleDrugAdverseEvents => "single_adverse_events",
    }
}

/// Truncates `text` to [`KEY_NOTE_MAX_CHARS`] characters at a char boundary.
fn truncate(text: &str) -> String {
    if text.chars().count() <= KEY_NOTE_MAX_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(KEY_NOTE_MAX_CHARS).collect();
    truncated.push('\u{2026}');
    truncated
}

/// Total-order comparator over `f64` reliability weights and confidences,
/// which never carry `NaN` in this pipeline.
fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use interax_core::Timestamp;

    use super::*;

    fn record(origin: Origin, severity: Severity, summary: &str) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence: origin.base_confidence(),
            summary: summary.to_string(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    #[test]
    fn summary_uses_the_driving_source() {
        let merged = vec![record(Origin::RxnormInteractions, Severity::Severe, "Increased bleeding risk.")];
        let summary = build_summary(&merged, Severity::Severe, true);
        assert_eq!(summary, "Increased bleeding risk.");
    }

    #[test]
    fn empty_merge_with_primary_success_reports_no_interactions() {
        assert_eq!(build_summary(&[], Severity::None, true), "no significant interactions found");
    }

    #[test]
    fn empty_merge_without_primary_success_reports_limited_evidence() {
        assert_eq!(build_summary(&[], Severity::Unknown, false), "limited evidence available");
    }

    #[test]
    fn key_notes_cap_at_three_ranked_by_reliability() {
        let merged = vec![
            record(Origin::LiteratureAi, Severity::Mild, "lit"),
            record(Origin::RxnormInteractions, Severity::Severe, "rx"),
            record(Origin::LabelWarnings, Severity::Moderate, "label"),
            record(Origin::SupplementInteractions, Severity::Mild, "supp"),
        ];
        let notes = build_key_notes(&merged);
        assert_eq!(notes.len(), 3);
        assert!(notes[0].starts_with("rxnorm_interactions"));
    }
}
