//! The per-provider result shape and error taxonomy (C4, §4.4, §7).

use interax_http::HttpError;
use thiserror::Error;

/// A provider call's result: found data, a normalized "looked and found
/// nothing" outcome, or an error.
///
/// `NotFound` is deliberately distinct from `Err`: it is the normalized
/// "looked, found nothing" case (§4.4), never treated as a failure by the
/// orchestrator.
#[derive(Debug, Clone)]
pub enum ProviderOutcome<T> {
    /// The provider returned data.
    Found(T),
    /// The provider looked and found nothing; not an error.
    NotFound,
    /// The provider call failed.
    Err(ProviderError),
}

impl<T> ProviderOutcome<T> {
    /// True when the outcome is [`ProviderOutcome::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// True when the outcome is [`ProviderOutcome::Err`].
    #[must_use]
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Converts to `Option<&T>`, discarding the not-found/error
    /// distinction.
    #[must_use]
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Err(_) => None,
        }
    }
}

/// Errors a provider adapter can surface. Never propagated past the
/// orchestrator: captured and converted into a [`crate::ProviderStatus`]-like
/// trace entry, degrading the affected evidence to absent (§7).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider's required API credential was not configured. The
    /// orchestrator treats this the same as a clean skip, never a request
    /// failure.
    #[error("missing credential for provider")]
    MissingCredential,
    /// The underlying HTTP call failed (timeout, transport, or parse).
    #[error(transparent)]
    Http(#[from] HttpError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_extracts_value() {
        let outcome: ProviderOutcome<u32> = ProviderOutcome::Found(7);
        assert_eq!(outcome.found(), Some(&7));
        assert!(outcome.is_found());
        assert!(!outcome.is_err());
    }

    #[test]
    fn not_found_is_not_an_error() {
        let outcome: ProviderOutcome<u32> = ProviderOutcome::NotFound;
        assert!(!outcome.is_err());
        assert_eq!(outcome.found(), None);
    }
}
