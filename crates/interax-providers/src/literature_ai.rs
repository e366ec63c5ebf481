//! The `literature_ai` adapter: an AI literature-synthesis collaborator
//! gated behind its own API key.

use std::time::Duration;

use interax_config::Secret;
use serde::{Deserialize, Serialize};

use crate::endpoints::ProviderEndpoints;
use crate::outcome::{ProviderError, ProviderOutcome};

/// A literature-synthesized finding for a drug pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteratureAiFinding {
    /// The synthesis's free-text severity label.
    pub severity: String,
    /// A short human-readable summary.
    pub summary: String,
    /// External references the synthesis cited.
    pub citations: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LiteratureAiRequest<'a> {
    drug_a: &'a str,
    drug_b: &'a str,
}

#[derive(Debug, Deserialize)]
struct LiteratureAiResponse {
    finding: Option<RawFinding>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    severity: String,
    summary: String,
    #[serde(default)]
    citations: Vec<String>,
}

/// Requests a literature synthesis for the pair `(name_a, name_b)`.
pub async fn literature_ai(
    client: &reqwest::Client,
    endpoints: &ProviderEndpoints,
    api_key: Option<&Secret>,
    name_a: &str,
    name_b: &str,
    timeout: Duration,
) -> ProviderOutcome<LiteratureAiFinding> {
    let Some(api_key) = api_key else {
        return ProviderOutcome::Err(ProviderError::MissingCredential);
    };
    let url = format!("{}/analyze", endpoints.literature_ai_base_url);
    let body = LiteratureAiRequest { drug_a: name_a, drug_b: name_b };
    let response = interax_http::timed_fetch(
        || client.post(&url).bearer_auth(api_key.expose()).json(&body).send(),
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
    let parsed: LiteratureAiResponse = match interax_http::decode_json(&bytes) {
        Ok(parsed) => parsed,
        Err(err) => return ProviderOutcome::Err(ProviderError::Http(err)),
    };
    match parsed.finding {
        Some(raw) => ProviderOutcome::Found(LiteratureAiFinding {
            severity: raw.severity,
            summary: raw.summary,
            citations: raw.citations,
        }),
        None => ProviderOutcome::NotFound,
    }
}
