//! Environment credential resolution.
//!
//! A required database connection string, plus three optional credentials:
//! a supplement-provider API key, a literature_ai API key, and a debug
//! toggle. Unset optional credentials deterministically disable their
//! provider with `MissingCredential` at the provider layer; they never fail
//! the request (§6, §4.11).

use std::env;
use std::fmt;

use crate::error::ConfigError;

/// Environment variable carrying the required database connection string.
pub const DATABASE_URL_VAR: &str = "INTERAX_DATABASE_URL";
/// Environment variable carrying the optional supplement-provider API key.
pub const SUPPLEMENT_API_KEY_VAR: &str = "INTERAX_SUPPLEMENT_API_KEY";
/// Environment variable carrying the optional literature_ai API key.
pub const LITERATURE_AI_API_KEY_VAR: &str = "INTERAX_LITERATURE_AI_API_KEY";
/// Environment variable toggling debug-mode provider tracing.
pub const DEBUG_VAR: &str = "INTERAX_DEBUG";

/// A credential value that never reaches a `Debug` or `Display` impl in
/// cleartext, so error paths built from it can never leak a secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a raw credential value.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the underlying value. Callers must not log or display the
    /// result; use this only to hand the credential to the HTTP client
    /// that needs it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Resolved environment credentials for one pipeline run.
#[derive(Clone)]
pub struct Credentials {
    /// The required database connection string.
    pub database_url: Secret,
    /// The supplement-provider API key, absent disables that provider.
    pub supplement_api_key: Option<Secret>,
    /// The literature_ai API key, absent disables that provider.
    pub literature_ai_api_key: Option<Secret>,
    /// Whether debug-mode provider tracing defaults to enabled.
    pub debug_enabled: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("database_url", &self.database_url)
            .field("supplement_api_key", &self.supplement_api_key.as_ref().map(|_| "<redacted>"))
            .field("literature_ai_api_key", &self.literature_ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("debug_enabled", &self.debug_enabled)
            .finish()
    }
}

impl Credentials {
    /// Resolves credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] when `DATABASE_URL_VAR` is
    /// unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = read_required(DATABASE_URL_VAR)?;
        Ok(Self {
            database_url: Secret::new(database_url),
            supplement_api_key: read_optional(SUPPLEMENT_API_KEY_VAR).map(Secret::new),
            literature_ai_api_key: read_optional(LITERATURE_AI_API_KEY_VAR).map(Secret::new),
            debug_enabled: read_optional(DEBUG_VAR).is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true")),
        })
    }

    /// Whether the supplement-provider credential is present.
    #[must_use]
    pub fn has_supplement_key(&self) -> bool {
        self.supplement_api_key.is_some()
    }

    /// Whether the literature_ai credential is present.
    #[must_use]
    pub fn has_literature_ai_key(&self) -> bool {
        self.literature_ai_api_key.is_some()
    }
}

/// Reads a required environment variable, rejecting an unset or
/// empty-string value.
fn read_required(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingRequired(var.to_string())),
    }
}

/// Reads an optional environment variable, treating an empty string the
/// same as unset.
fn read_optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn secret_debug_never_shows_cleartext() {
        let secret = Secret::new("super-secret-value".to_string());
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("super-secret-value"));
    }

    #[test]
    fn secret_display_never_shows_cleartext() {
        let secret = Secret::new("super-secret-value".to_string());
        assert_eq!(secret.to_string(), "<redacted>");
    }

    #[test]
    fn credentials_debug_never_shows_cleartext() {
        let creds = Credentials {
            database_url: Secret::new("postgres://u:p@host/db".to_string()),
            supplement_api_key: Some(Secret::new("sup-key".to_string())),
            literature_ai_api_key: None,
            debug_enabled: false,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("postgres://u:p@host/db"));
        assert!(!rendered.contains("sup-key"));
    }
}
