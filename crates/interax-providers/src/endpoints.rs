//! Upstream endpoint configuration.
//!
//! RxNorm and openFDA are public, unauthenticated APIs and are addressed
//! directly; the supplement authority and literature_ai endpoints are
//! credential-gated third parties and are configured at construction time
//! rather than hardcoded, since they are opaque upstream collaborators
//! (§1's Non-goals).

/// Base URL for the NIH RxNorm REST API.
pub const RXNORM_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";
/// Base URL for the openFDA API, used for label warnings and adverse
/// events.
pub const OPENFDA_BASE_URL: &str = "https://api.fda.gov";
/// Base URL for the CMS public data catalog, used for beneficiary-exposure
/// estimates.
pub const CMS_BASE_URL: &str = "https://data.cms.gov/data-api/v1";

/// Endpoint configuration for the credential-gated upstream authorities.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// RxNorm REST API base URL.
    pub rxnorm_base_url: String,
    /// openFDA API base URL.
    pub openfda_base_url: String,
    /// CMS public data catalog base URL.
    pub cms_base_url: String,
    /// Supplement-interaction authority base URL.
    pub supplement_base_url: String,
    /// literature_ai synthesis endpoint base URL.
    pub literature_ai_base_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            rxnorm_base_url: RXNORM_BASE_URL.to_string(),
            openfda_base_url: OPENFDA_BASE_URL.to_string(),
            cms_base_url: CMS_BASE_URL.to_string(),
            supplement_base_url: "https://supplement-authority.invalid".to_string(),
            literature_ai_base_url: "https://literature-ai.invalid".to_string(),
        }
    }
}
