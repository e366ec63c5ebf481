//! Severity tag set and its fixed total order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed tag set used throughout the pipeline to describe interaction
/// severity, with a fixed total order `unknown < none < mild < moderate <
/// severe`.
///
/// `Unknown` means evidence was insufficient to decide; `None` means at
/// least one primary source looked and found nothing. The two are
/// deliberately distinct values, never collapsed into one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Evidence was insufficient to decide.
    Unknown,
    /// At least one primary source looked and found nothing.
    None,
    /// Mild interaction.
    Mild,
    /// Moderate interaction.
    Moderate,
    /// Severe interaction.
    Severe,
}

impl Severity {
    /// Returns the severity with the greater rank under the fixed total
    /// order, preferring `self` on ties.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    /// Maps a provider-supplied free-text label onto the fixed tag set via
    /// the token map `major|severe -> severe`, `moderate -> moderate`,
    /// `minor|mild -> mild`, otherwise `unknown`. Matching is
    /// case-insensitive substring containment.
    #[must_use]
    pub fn from_provider_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("severe") || lower.contains("major") {
            Self::Severe
        } else if lower.contains("moderate") {
            Self::Moderate
        } else if lower.contains("minor") || lower.contains("mild") {
            Self::Mild
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::None => "none",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_matches_spec() {
        assert!(Severity::Unknown < Severity::None);
        assert!(Severity::None < Severity::Mild);
        assert!(Severity::Mild < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
    }

    #[test]
    fn max_prefers_higher_rank() {
        assert_eq!(Severity::Mild.max(Severity::Severe), Severity::Severe);
        assert_eq!(Severity::Severe.max(Severity::Mild), Severity::Severe);
    }

    #[test]
    fn from_provider_label_maps_tokens() {
        assert_eq!(Severity::from_provider_label("Major"), Severity::Severe);
        assert_eq!(Severity::from_provider_label("Severe interaction"), Severity::Severe);
        assert_eq!(Severity::from_provider_label("Moderate"), Severity::Moderate);
        assert_eq!(Severity::from_provider_label("minor"), Severity::Mild);
        assert_eq!(Severity::from_provider_label("mild"), Severity::Mild);
        assert_eq!(Severity::from_provider_label("contraindicated"), Severity::Unknown);
    }
}
