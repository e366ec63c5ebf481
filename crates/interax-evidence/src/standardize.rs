//! Standardizers (C6, §4.6): one function per provider family, each
//! mapping a raw provider result onto a uniform [`EvidenceRecord`].
//!
//! A standardizer returns `None` exactly when the raw result carries
//! nothing actionable after its own filtering (an accepted label with no
//! surviving warnings, an empty supplement-interaction list) — distinct
//! from the provider itself returning [`interax_providers::ProviderOutcome::NotFound`].

use std::collections::{BTreeMap, BTreeSet};

use interax_core::{DenominatorMethod, EvidenceRecord, EvidenceStats, Origin, Severity, Timestamp};
use interax_providers::{AdverseEventResult, LabelWarningsResult, LiteratureAiFinding, RxnormInteractionResult, SupplementInteractionFinding};

use crate::confidence::per_record_confidence;

/// Standardizes a RxNorm interaction finding.
#[must_use]
pub fn standardize_rxnorm_interaction(result: &RxnormInteractionResult, observed_at: Timestamp) -> EvidenceRecord {
    let severity = Severity::from_provider_label(&result.severity);
    let confidence = per_record_confidence(Origin::RxnormInteractions, severity, None);
    let mut details = BTreeMap::new();
    details.insert("source".to_string(), serde_json::Value::String(result.source.clone()));
    EvidenceRecord {
        origin: Origin::RxnormInteractions,
        severity,
        confidence,
        summary: result.description.clone(),
        details,
        citations: BTreeSet::new(),
        stats: None,
        observed_at,
    }
}

/// Standardizes a list of supplement-interaction findings into a single
/// record. Returns `None` when the list is empty.
#[must_use]
pub fn standardize_supplement_interactions(findings: &[SupplementInteractionFinding], observed_at: Timestamp) -> Option<EvidenceRecord> {
    if findings.is_empty() {
        return None;
    }
    let severity = findings.iter().map(|finding| Severity::from_provider_label(&finding.severity)).max().unwrap_or(Severity::Unknown);
    let confidence = per_record_confidence(Origin::SupplementInteractions, severity, None);
    let summary = findings.iter().map(|finding| finding.description.clone()).max_by_key(String::len).unwrap_or_default();
    Some(EvidenceRecord {
        origin: Origin::SupplementInteractions,
        severity,
        confidence,
        summary,
        details: BTreeMap::new(),
        citations: BTreeSet::new(),
        stats: None,
        observed_at,
    })
}

/// Standardizes a label-warnings result. Label severity always defaults to
/// moderate (§4.6); returns `None` when every candidate warning was
/// filtered out.
#[must_use]
pub fn standardize_label_warnings(result: &LabelWarningsResult, observed_at: Timestamp) -> Option<EvidenceRecord> {
    if result.warnings.is_empty() {
        return None;
    }
    let severity = Severity::Moderate;
    let confidence = per_record_confidence(Origin::LabelWarnings, severity, None);
    let summary = result.warnings.iter().max_by_key(|warning| warning.len()).cloned().unwrap_or_default();
    let mut details = BTreeMap::new();
    details.insert("product_name".to_string(), serde_json::Value::String(result.product_name.clone()));
    details.insert("warning_count".to_string(), serde_json::Value::from(result.warnings.len()));
    let mut citations = BTreeSet::new();
    if let Some(identifier) = &result.identifier {
        citations.insert(identifier.clone());
    }
    Some(EvidenceRecord { origin: Origin::LabelWarnings, severity, confidence, summary, details, citations, stats: None, observed_at })
}

/// Derives adverse-event severity from counts and, when an exposure
/// denominator is known, from the serious-event rate.
#[must_use]
pub fn derive_adverse_event_severity(serious_events: u64, serious_event_rate: Option<f64>) -> Severity {
    let count_based = if serious_events > 1000 {
        Severity::Severe
    } else if serious_events > 100 {
        Severity::Moderate
    } else if serious_events > 0 {
        Severity::Mild
    } else {
        Severity::Unknown
    };
    if let Some(rate) = serious_event_rate {
        if rate > 1e-2 {
            return Severity::Severe;
        }
        if rate > 1e-3 {
            return Severity::Moderate;
        }
    }
    count_based
}

/// Builds the [`EvidenceStats`] for an adverse-event result, computing
/// rates only when a non-zero exposure estimate is known.
#[must_use]
pub fn adverse_event_stats(
    result: &AdverseEventResult,
    beneficiaries: Option<u64>,
    denominator_method: Option<DenominatorMethod>,
) -> EvidenceStats {
    #[allow(clippy::cast_precision_loss, reason = "report counts stay well under f64's mantissa")]
    let rate_against = |count: u64| beneficiaries.filter(|b| *b > 0).map(|b| count as f64 / b as f64);
    EvidenceStats {
        total_events: Some(result.total_events),
        serious_events: Some(result.serious_events),
        beneficiaries,
        event_rate: rate_against(result.total_events),
        serious_event_rate: rate_against(result.serious_events),
        denominator_method,
    }
}

/// Standardizes an adverse-event count result for either a pair or a
/// single item, tagging it with the appropriate [`Origin`].
#[must_use]
pub fn standardize_adverse_events(
    origin: Origin,
    result: &AdverseEventResult,
    beneficiaries: Option<u64>,
    denominator_method: Option<DenominatorMethod>,
    observed_at: Timestamp,
) -> EvidenceRecord {
    let stats = adverse_event_stats(result, beneficiaries, denominator_method);
    let severity = derive_adverse_event_severity(result.serious_events, stats.serious_event_rate);
    let confidence = per_record_confidence(origin, severity, Some(&stats));
    let summary = format!("{} adverse event reports ({} serious)", result.total_events, result.serious_events);
    let details = result
        .outcomes
        .iter()
        .map(|(outcome, count)| (outcome.clone(), serde_json::Value::from(*count)))
        .collect();
    EvidenceRecord { origin, severity, confidence, summary, details, citations: BTreeSet::new(), stats: Some(stats), observed_at }
}

/// Standardizes a literature-AI finding.
#[must_use]
pub fn standardize_literature_ai(finding: &LiteratureAiFinding, observed_at: Timestamp) -> EvidenceRecord {
    let severity = Severity::from_provider_label(&finding.severity);
    let confidence = per_record_confidence(Origin::LiteratureAi, severity, None);
    EvidenceRecord {
        origin: Origin::LiteratureAi,
        severity,
        confidence,
        summary: finding.summary.clone(),
        details: BTreeMap::new(),
        citations: finding.citations.iter().cloned().collect(),
        stats: None,
        observed_at,
    }
}
