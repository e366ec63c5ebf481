//! The `label_warnings` adapter against openFDA structured product labels.
//!
//! Implements the critical label matching policy (§4.4): a tiered query
//! strategy followed by a primary-ingredient post-filter, so the adapter
//! never attributes a warning to the wrong drug.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

/// Static table of common NSAIDs, consulted only to reject cross-class
/// confusions — never to infer an interaction (§4.4, Open Question §9,
/// resolved here as configurable policy data rather than a general
/// classifier).
pub const NSAID_CLASS_TABLE: &[&str] = &[
    "ibuprofen",
    "naproxen",
    "diclofenac",
    "celecoxib",
    "indomethacin",
    "ketorolac",
    "meloxicam",
    "piroxicam",
    "aspirin",
];

/// Result of a successful label lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelWarningsResult {
    /// Warning sentences surviving the post-filter; empty when every
    /// candidate warning was filtered out.
    pub warnings: Vec<String>,
    /// The label's product name.
    pub product_name: String,
    /// The label's known authority identifier, if any.
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenFdaLabelResponse {
    #[serde(default)]
    results: Vec<RawLabelRecord>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLabelRecord {
    #[serde(default)]
    openfda: OpenFdaFields,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    warnings_and_cautions: Vec<String>,
    #[serde(default)]
    boxed_warning: Vec<String>,
    #[serde(default)]
    drug_interactions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenFdaFields {
    #[serde(default)]
    generic_name: Vec<String>,
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    substance_name: Vec<String>,
    #[serde(default)]
    rxcui: Vec<String>,
}

impl RawLabelRecord {
    fn product_name(&self) -> String {
        self.openfda
            .brand_name
            .first()
            .or_else(|| self.openfda.generic_name.first())
            .cloned()
            .unwrap_or_default()
    }

    fn identifier(&self) -> Option<String> {
        self.openfda.rxcui.first().cloned()
    }

    fn all_warnings(&self) -> Vec<String> {
        self.warnings
            .iter()
            .chain(&self.warnings_and_cautions)
            .chain(&self.boxed_warning)
            .chain(&self.drug_interactions)
            .cloned()
            .collect()
    }

    /// The primary-ingredient acceptance check: the candidate's
    /// generic/substance/brand name must contain the queried canonical
    /// name, and it must not list a different well-known NSAID as its
    /// primary ingredient.
    fn accepts(&self, canonical_name: &str) -> bool {
        let haystacks: Vec<String> = self
            .openfda
            .generic_name
            .iter()
            .chain(&self.openfda.substance_name)
            .chain(&self.openfda.brand_name)
            .map(|s| s.to_lowercase())
            .collect();
        let name_matches = haystacks.iter().any(|h| h.contains(canonical_name));
        if !name_matches {
            return false;
        }
        let primary = self.openfda.generic_name.first().map(|s| s.to_lowercase()).unwrap_or_default();
        !is_different_nsaid_class_member(&primary, canonical_name)
    }
}

/// True when `primary` names a different NSAID class member than the one
/// being queried.
fn is_different_nsaid_class_member(primary: &str, canonical_name: &str) -> bool {
    NSAID_CLASS_TABLE.iter().any(|drug| primary.contains(drug) && !canonical_name.contains(drug))
}

/// Removes any warning sentence that mentions a different NSAID class
/// member than the one being queried.
fn filter_warnings(warnings: Vec<String>, canonical_name: &str) -> Vec<String> {
    warnings
        .into_iter()
        .filter(|warning| {
            let lower = warning.to_lowercase();
            !NSAID_CLASS_TABLE.iter().any(|drug| !canonical_name.contains(drug) && lower.contains(drug))
        })
        .collect()
}

/// The four tiered query strategies, tried in order until one yields an
/// accepted candidate.
enum Tier<'a> {
    /// Exact match on a known authority identifier.
    Identifier(&'a str),
    /// Exact-phrase match on generic name.
    GenericName,
    /// Exact-phrase match on brand name.
    BrandName,
    /// Broad phrase fallback, relying entirely on the post-filter.
    Broad,
}

fn search_query(tier: &Tier<'_>, canonical_name: &str) -> String {
    match tier {
        Tier::Identifier(id) => format!("openfda.rxcui:\"{id}\""),
        Tier::GenericName => format!("openfda.generic_name:\"{canonical_name}\""),
        Tier::BrandName => format!("openfda.brand_name:\"{canonical_name}\""),
        Tier::Broad => format!("openfda.substance_name:{canonical_name}"),
    }
}

/// Fetches label warnings for `canonical_name`, applying the tiered query
/// strategy and the primary-ingredient post-filter.
///
/// Each tier's HTTP fetch is itself retried via
/// [`interax_http::fetch_with_retry`] (`max_retries`, `backoff_base`) before
/// the tiered search moves on to the next strategy, so a single transient
/// failure on an early tier never aborts the whole lookup.
pub async fn label_warnings(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    canonical_name: &str,
    known_identifier: Option<&str>,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
) -> ProviderOutcome<LabelWarningsResult> {
    let mut tiers = Vec::new();
    if let Some(id) = known_identifier {
        tiers.push(Tier::Identifier(id));
    }
    tiers.push(Tier::GenericName);
    tiers.push(Tier::BrandName);
    tiers.push(Tier::Broad);

    for tier in &tiers {
        match fetch_tier(client, endpoints, tier, canonical_name, timeout, max_retries, backoff_base).await {
            Ok(Some(record)) if record.accepts(canonical_name) => {
                let warnings = filter_warnings(record.all_warnings(), canonical_name);
                return ProviderOutcome::Found(LabelWarningsResult {
                    warnings,
                    product_name: record.product_name(),
                    identifier: record.identifier(),
                });
            }
            Ok(_) => continue,
            Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
        }
    }
    ProviderOutcome::NotFound
}

async fn fetch_tier(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    tier: &Tier<'_>,
    canonical_name: &str,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
) -> Result<Option<RawLabelRecord>, interax_http::HttpError> {
    let url = format!("{}/drug/label.json", endpoints.openfda_base_url);
    let query = search_query(tier, canonical_name);
    let response = interax_http::fetch_with_retry(
        || client.get(&url).query(&[("search", query.as_str()), ("limit", "1")]).send(),
        timeout,
        max_retries,
        backoff_base,
    )
    .await?;
    if response.status().as_u16() == 404 {
        return Ok(None);
    }
    let response = interax_http::ensure_success(response)?;
    let bytes = interax_http::read_body_limited(response, interax_http::MAX_RESPONSE_BYTES).await?;
    let parsed: OpenFdaLabelResponse = interax_http::decode_json(&bytes)?;
    Ok(parsed.results.into_iter().next())
}
