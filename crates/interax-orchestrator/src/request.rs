//! The request shape accepted by [`crate::Pipeline::analyze`] (§6).

use interax_core::PipelineError;
use serde::{Deserialize, Serialize};

/// Per-request overrides of the default pipeline behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Bypasses every cache read for this request; cache writes still
    /// happen as usual.
    #[serde(default)]
    pub force_refresh: bool,
    /// Overrides the credential-derived debug default for this request.
    #[serde(default)]
    pub debug: Option<bool>,
    /// Whether `literature_ai` may run for this request, on top of its
    /// existing credential gate. Defaults to `true` when absent.
    #[serde(default)]
    pub include_ai: Option<bool>,
    /// Whether the CMS exposure fetch may run for this request. Defaults
    /// to `true` when absent.
    #[serde(default)]
    pub include_cms: Option<bool>,
}

/// A request to analyze a list of items for pairwise and triple-wise
/// interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// The caller's original item spellings, `1..=max_items` of them.
    pub items: Vec<String>,
    /// Optional per-request overrides.
    #[serde(default)]
    pub options: Option<AnalyzeOptions>,
}

impl AnalyzeRequest {
    /// Rejects items that are empty or whitespace-only, a stricter check
    /// than the bare count bound [`interax_core::normalize_items`] already
    /// enforces.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when any item is empty or
    /// whitespace-only.
    pub fn validate_values(&self) -> Result<(), PipelineError> {
        if self.items.iter().any(|item| item.trim().is_empty()) {
            return Err(PipelineError::InvalidInput("items must not be empty or whitespace-only".to_string()));
        }
        Ok(())
    }

    /// Whether the caller asked to bypass cache reads for this request.
    #[must_use]
    pub fn force_refresh(&self) -> bool {
        self.options.is_some_and(|options| options.force_refresh)
    }

    /// Resolves the effective debug toggle: the request's override, falling
    /// back to `credential_default`.
    #[must_use]
    pub fn debug_enabled(&self, credential_default: bool) -> bool {
        self.options.and_then(|options| options.debug).unwrap_or(credential_default)
    }

    /// Whether `literature_ai` is permitted to run for this request,
    /// independent of its credential gate. Defaults to `true`.
    #[must_use]
    pub fn include_ai(&self) -> bool {
        self.options.and_then(|options| options.include_ai).unwrap_or(true)
    }

    /// Whether the CMS exposure fetch is permitted to run for this
    /// request. Defaults to `true`.
    #[must_use]
    pub fn include_cms(&self) -> bool {
        self.options.and_then(|options| options.include_cms).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn whitespace_only_item_is_invalid() {
        let request = AnalyzeRequest { items: vec!["warfarin".to_string(), "   ".to_string()], options: None };
        assert!(request.validate_values().is_err());
    }

    #[test]
    fn force_refresh_defaults_to_false() {
        let request = AnalyzeRequest { items: vec!["warfarin".to_string()], options: None };
        assert!(!request.force_refresh());
    }

    #[test]
    fn debug_option_overrides_credential_default() {
        let request = AnalyzeRequest {
            items: vec!["warfarin".to_string()],
            options: Some(AnalyzeOptions { debug: Some(true), ..AnalyzeOptions::default() }),
        };
        assert!(request.debug_enabled(false));
        let fallback = AnalyzeRequest { items: vec!["warfarin".to_string()], options: None };
        assert!(fallback.debug_enabled(true));
    }

    #[test]
    fn include_ai_and_include_cms_default_to_true() {
        let request = AnalyzeRequest { items: vec!["warfarin".to_string()], options: None };
        assert!(request.include_ai());
        assert!(request.include_cms());
    }

    #[test]
    fn include_ai_and_include_cms_can_be_disabled() {
        let request = AnalyzeRequest {
            items: vec!["warfarin".to_string()],
            options: Some(AnalyzeOptions { include_ai: Some(false), include_cms: Some(false), ..AnalyzeOptions::default() }),
        };
        assert!(!request.include_ai());
        assert!(!request.include_cms());
    }
}
