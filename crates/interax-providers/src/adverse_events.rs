//! `pair_adverse_events` and `single_adverse_events` adapters against the
//! openFDA adverse-event reporting API.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

/// Adverse-event counts for a drug or drug pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdverseEventResult {
    /// Total matching reports.
    pub total_events: u64,
    /// Reports flagged serious by the upstream.
    pub serious_events: u64,
    /// Report counts grouped by reported outcome.
    pub outcomes: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Meta {
    results: MetaResults,
}

#[derive(Debug, Deserialize)]
struct MetaResults {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(default)]
    results: Vec<CountBucket>,
}

#[derive(Debug, Deserialize)]
struct CountBucket {
    term: String,
    count: u64,
}

/// Builds an openFDA `search` term for a pair of drug names, combined with
/// `AND` per the upstream's query grammar.
fn pair_search(name_a: &str, name_b: &str) -> String {
    format!(
        "patient.drug.medicinalproduct:\"{name_a}\" AND patient.drug.medicinalproduct:\"{name_b}\""
    )
}

/// Builds an openFDA `search` term for a single drug name.
fn single_search(name: &str) -> String {
    format!("patient.drug.medicinalproduct:\"{name}\"")
}

async fn fetch_total(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    search: &str,
    timeout: Duration,
) -> Result<u64, interax_http::HttpError> {
    let url = format!("{}/drug/event.json", endpoints.openfda_base_url);
    let response =
        interax_http::timed_fetch(|| client.get(&url).query(&[("search", search), ("limit", "1")]).send(), timeout)
            .await?;
    if response.status().as_u16() == 404 {
        return Ok(0);
    }
    let response = interax_http::ensure_success(response)?;
    let bytes = interax_http::read_body_limited(response, interax_http::MAX_RESPONSE_BYTES).await?;
    let parsed: MetaResponse = interax_http::decode_json(&bytes)?;
    Ok(parsed.meta.results.total)
}

async fn fetch_count_buckets(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    search: &str,
    count_field: &str,
    timeout: Duration,
) -> Result<Vec<CountBucket>, interax_http::HttpError> {
    let url = format!("{}/drug/event.json", endpoints.openfda_base_url);
    let response = interax_http::timed_fetch(
        || client.get(&url).query(&[("search", search), ("count", count_field)]).send(),
        timeout,
    )
    .await?;
    if response.status().as_u16() == 404 {
        return Ok(Vec::new());
    }
    let response = interax_http::ensure_success(response)?;
    let bytes = interax_http::read_body_limited(response, interax_http::MAX_RESPONSE_BYTES).await?;
    let parsed: CountResponse = interax_http::decode_json(&bytes)?;
    Ok(parsed.results)
}

/// Assembles counts and the outcome breakdown for a completed `search`.
async fn assemble(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    search: &str,
    timeout: Duration,
) -> Result<ProviderOutcome<AdverseEventResult>, interax_http::HttpError> {
    let total = fetch_total(client, endpoints, search, timeout).await?;
    if total == 0 {
        return Ok(ProviderOutcome::NotFound);
    }
    let serious_buckets = fetch_count_buckets(client, endpoints, search, "serious", timeout).await?;
    let serious_events = serious_buckets.iter().find(|bucket| bucket.term == "1").map_or(0, |bucket| bucket.count);
    let outcome_buckets =
        fetch_count_buckets(client, endpoints, search, "patient.reaction.reactionoutcome.exact", timeout).await?;
    let outcomes = outcome_buckets.into_iter().map(|bucket| (bucket.term, bucket.count)).collect();
    Ok(ProviderOutcome::Found(AdverseEventResult { total_events: total, serious_events, outcomes }))
}

/// Fetches adverse-event counts for a drug pair.
pub async fn pair_adverse_events(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    name_a: &str,
    name_b: &str,
    timeout: Duration,
) -> ProviderOutcome<AdverseEventResult> {
    let search = pair_search(name_a, name_b);
    match assemble(client, endpoints, &search, timeout).await {
        Ok(outcome) => outcome,
        Err(err) => ProviderOutcome::Err(ProviderError::Http(err)),
    }
}

/// Fetches adverse-event counts for a single drug.
pub async fn single_adverse_events(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    name: &str,
    timeout: Duration,
) -> ProviderOutcome<AdverseEventResult> {
    let search = single_search(name);
    match assemble(client, endpoints, &search, timeout).await {
        Ok(outcome) => outcome,
        Err(err) => ProviderOutcome::Err(ProviderError::Http(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_search_combines_both_names_with_and() {
        let search = pair_search("warfarin", "ibuprofen");
        assert!(search.contains("warfarin"));
        assert!(search.contains("ibuprofen"));
        assert!(search.contains(" AND "));
    }

    #[test]
    fn single_search_names_one_drug() {
        assert_eq!(single_search("warfarin"), "patient.drug.medicinalproduct:\"warfarin\"");
    }
}
