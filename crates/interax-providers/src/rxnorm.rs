//! `rxnorm_lookup` and `rxnorm_interactions` adapters against the NIH
//! RxNorm REST API.
//!
//! `rxnorm_interactions` uses the single-RxCUI probe strategy with a
//! post-filter (Open Question §9, resolved in favor of this strategy): it
//! fetches the full interaction set for one identifier and checks whether
//! the other identifier appears among the interaction pairs, rather than
//! querying the pair directly. This is resilient to the upstream's
//! documented deprecation, which now returns 404 for the pair-query form —
//! a 404 here is normalized to `NotFound`, not an error.

use std::time::Duration;

use serde::Deserialize;

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RxcuiLookupResponse {
    #[serde(default)]
    id_group: IdGroup,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct IdGroup {
    #[serde(default)]
    rxnorm_id: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct InteractionResponse {
    #[serde(default)]
    interaction_type_group: Vec<InteractionTypeGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionTypeGroup {
    #[serde(default)]
    interaction_type: Vec<InteractionType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionType {
    #[serde(default)]
    interaction_pair: Vec<InteractionPair>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionPair {
    #[serde(default)]
    interaction_concept: Vec<InteractionConcept>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionConcept {
    min_concept_item: MinConceptItem,
}

#[derive(Debug, Deserialize)]
struct MinConceptItem {
    rxcui: String,
}

/// A standardizable RxNorm interaction finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxnormInteractionResult {
    /// The upstream's free-text severity label.
    pub severity: String,
    /// The upstream's free-text description.
    pub description: String,
    /// Literal source tag, always `"rxnorm"`.
    pub source: String,
}

/// Resolves `canonical_name` to an opaque RxNorm identifier (RxCUI).
pub async fn rxnorm_lookup(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    canonical_name: &str,
    timeout: Duration,
) -> ProviderOutcome<String> {
    let url = format!("{}/rxcui.json", endpoints.rxnorm_base_url);
    let response = interax_http::timed_fetch(
        || client.get(&url).query(&[("name", canonical_name)]).send(),
        timeout,
    )
    .await;
    let response = match response {
        Ok(response) => response,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    let response = match interax_http::ensure_success(response) {
        Ok(response) => response,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    let bytes = match interax_http::read_body_limited(response, interax_http::MAX_RESPONSE_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    let parsed: RxcuiLookupResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    match parsed.id_group.rxnorm_id.into_iter().next() {
        Some(id) => ProviderOutcome::Found(id),
        None => ProviderOutcome::NotFound,
    }
}

/// Checks whether `rxcui_b` appears in `rxcui_a`'s interaction graph, by
/// fetching `rxcui_a`'s full interaction set and post-filtering for
/// `rxcui_b`.
pub async fn rxnorm_interactions(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    rxcui_a: &str,
    rxcui_b: &str,
    timeout: Duration,
) -> ProviderOutcome<RxnormInteractionResult> {
    let url = format!("{}/interaction/interaction.json", endpoints.rxnorm_base_url);
    let response = interax_http::timed_fetch(|| client.get(&url).query(&[("rxcui", rxcui_a)]).send(), timeout).await;
    let response = match response {
        Ok(response) => response,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    if response.status().as_u16() == 404 {
        // The upstream's documented deprecation surfaces a discontinued
        // pair as 404; this is normalized "no interactions", not a
        // failure.
        return ProviderOutcome::NotFound;
    }
    let response = match interax_http::ensure_success(response) {
        Ok(response) => response,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    let bytes = match interax_http::read_body_limited(response, interax_http::MAX_RESPONSE_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    let parsed: InteractionResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    find_pair_with(&parsed, rxcui_b).map_or(ProviderOutcome::NotFound, ProviderOutcome::Found)
}

/// Scans every interaction pair in `response` for one whose concept list
/// includes `rxcui_b`.
fn find_pair_with(response: &InteractionResponse, rxcui_b: &str) -> Option<RxnormInteractionResult> {
    response
        .interaction_type_group
        .iter()
        .flat_map(|group| &group.interaction_type)
        .flat_map(|kind| &kind.interaction_pair)
        .find(|pair| pair.interaction_concept.iter().any(|concept| concept.min_concept_item.rxcui == rxcui_b))
        .map(|pair| RxnormInteractionResult {
            severity: pair.severity.clone().unwrap_or_default(),
            description: pair.description.clone().unwrap_or_default(),
            source: "rxnorm".to_string(),
        })
}
