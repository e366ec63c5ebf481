//! The orchestrator's public-facing error taxonomy (§7).
//!
//! Per-layer errors (`HttpError`, `ProviderError`, `StoreError`,
//! `ConfigError`) live in their own crates, mirroring
//! `decision_gate_core::interfaces`'s per-trait error types. `PipelineError`
//! is the aggregate surfaced to a caller of `interax-orchestrator`.

use crate::limiter::LimiterError;
use crate::normalize::NormalizeError;

/// The orchestrator's public error surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// The request failed validation before any work began.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An unexpected internal failure, reported with an opaque,
    /// credential-free message.
    #[error("internal error: {0}")]
    Internal(String),
    /// A cache store failure surfaced after the in-memory response was
    /// already computed (§7).
    #[error("cache failure: {0}")]
    CacheFailure(String),
}

impl From<NormalizeError> for PipelineError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::InvalidInput(reason) => Self::InvalidInput(reason),
        }
    }
}

impl From<LimiterError> for PipelineError {
    fn from(err: LimiterError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_error_maps_to_invalid_input() {
        let err = PipelineError::from(NormalizeError::InvalidInput("bad".to_string()));
        assert!(matches!(err, PipelineError::InvalidInput(reason) if reason == "bad"));
    }
}
