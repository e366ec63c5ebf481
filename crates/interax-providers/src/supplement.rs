//! `supplement_lookup` and `supplement_interactions` adapters against the
//! credential-gated supplement authority.
//!
//! Both calls are skipped cleanly with [`ProviderError::MissingCredential`]
//! when no API key is configured; this never fails the request (§6).

use std::time::Duration;

use interax_config::Secret;
use serde::Deserialize;

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

#[derive(Debug, Deserialize)]
struct SupplementLookupResponse {
    identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupplementInteractionsResponse {
    #[serde(default)]
    interactions: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    severity: String,
    description: String,
}

/// A single supplement-interaction finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementInteractionFinding {
    /// The upstream's free-text severity label.
    pub severity: String,
    /// The upstream's free-text description.
    pub description: String,
}

/// Resolves `canonical_name` to an opaque supplement-authority identifier.
pub async fn supplement_lookup(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    api_key: Option<&Secret>,
    canonical_name: &str,
    timeout: Duration,
) -> ProviderOutcome<String> {
    let Some(api_key) = api_key else {
        return ProviderOutcome::Err(ProviderError::MissingCredential);
    };
    let url = format!("{}/lookup", endpoints.supplement_base_url);
    let response = interax_http::timed_fetch(
        || {
            client
                .get(&url)
                .bearer_auth(api_key.expose())
                .query(&[("name", canonical_name)])
                .send()
        },
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
    let parsed: SupplementLookupResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    parsed.identifier.map_or(ProviderOutcome::NotFound, ProviderOutcome::Found)
}

/// Fetches interaction findings between two supplement-authority
/// identifiers.
pub async fn supplement_interactions(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    api_key: Option<&Secret>,
    identifier_a: &str,
    identifier_b: &str,
    timeout: Duration,
) -> ProviderOutcome<Vec<SupplementInteractionFinding>> {
    let Some(api_key) = api_key else {
        return ProviderOutcome::Err(ProviderError::MissingCredential);
    };
    let url = format!("{}/interactions", endpoints.supplement_base_url);
    let response = interax_http::timed_fetch(
        || {
            client
                .get(&url)
                .bearer_auth(api_key.expose())
                .query(&[("a", identifier_a), ("b", identifier_b)])
                .send()
        },
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
    let parsed: SupplementInteractionsResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    if parsed.interactions.is_empty() {
        return ProviderOutcome::NotFound;
    }
    ProviderOutcome::Found(
        parsed
            .interactions
            .into_iter()
            .map(|raw| SupplementInteractionFinding { severity: raw.severity, description: raw.description })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[tokio::test]
    async fn lookup_without_credential_is_missing_credential() {
        let client = reqwest::Client::new();
        let endpoints = ProviderEndpoints::default();
        let outcome = supplement_lookup(&client, &endpoints, None, "ginkgo", Duration::from_millis(10)).await;
        assert!(matches!(outcome, ProviderOutcome::Err(ProviderError::MissingCredential)));
    }

    #[tokio::test]
    async fn interactions_without_credential_is_missing_credential() {
        let client = reqwest::Client::new();
        let endpoints = ProviderEndpoints::default();
        let outcome =
            supplement_interactions(&client, &endpoints, None, "a", "b", Duration::from_millis(10)).await;
        assert!(matches!(outcome, ProviderOutcome::Err(ProviderError::MissingCredential)));
    }
}
