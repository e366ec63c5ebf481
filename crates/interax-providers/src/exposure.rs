//! `cms_exposure` adapter against the CMS public claims data API.
//!
//! Unlike the supplement and literature_ai authorities, the CMS data
//! catalog is public and unauthenticated, so this adapter is addressed
//! directly like RxNorm and openFDA rather than credential-gated.

use std::time::Duration;

use serde::Deserialize;

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

/// An estimated beneficiary-exposure count for a single drug, plus where
/// it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsExposureResult {
    /// Estimated exposed-beneficiary count.
    pub beneficiaries: u64,
    /// Literal source tag, always `"cms_part_d"`.
    pub source: String,
}

#[derive(Debug, Deserialize, Default)]
struct CmsClaimsResponse {
    #[serde(default)]
    results: Vec<CmsClaimsRow>,
}

#[derive(Debug, Deserialize, Default)]
struct CmsClaimsRow {
    #[serde(default)]
    total_beneficiaries: Option<u64>,
}

/// Fetches the estimated Medicare Part D beneficiary count exposed to
/// `canonical_name`.
///
/// A 404 is normalized to [`ProviderOutcome::NotFound`], matching the
/// other count-reporting adapters' convention for "the upstream has no
/// row for this drug" rather than treating it as a failure.
pub async fn cms_exposure(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    canonical_name: &str,
    timeout: Duration,
) -> ProviderOutcome<CmsExposureResult> {
    let url = format!("{}/drug-spending-by-drug.json", endpoints.cms_base_url);
    let response = interax_http::timed_fetch(|| client.get(&url).query(&[("drug_name", canonical_name)]).send(), timeout).await;
    let response = match response {
        Ok(response) => response,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    if response.status().as_u16() == 404 {
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
    let parsed: CmsClaimsResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    match parsed.results.into_iter().find_map(|row| row.total_beneficiaries) {
        Some(beneficiaries) => ProviderOutcome::Found(CmsExposureResult { beneficiaries, source: "cms_part_d".to_string() }),
        None => ProviderOutcome::NotFound,
    }
}
