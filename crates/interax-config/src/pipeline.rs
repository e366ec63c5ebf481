//! Typed pipeline configuration: policy bounds, per-provider timeouts, retry
//! parameters, and concurrency limits (§6).

use crate::error::ConfigError;

/// Per-provider timeouts, in milliseconds, matching the table in §6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderTimeouts {
    /// `rxnorm_lookup` timeout.
    pub rxnorm_lookup_ms: u64,
    /// `rxnorm_interactions` timeout.
    pub rxnorm_interactions_ms: u64,
    /// `supplement_lookup` / `supplement_interactions` timeout.
    pub supplement_ms: u64,
    /// `label_warnings` timeout (first attempt; retries share this budget).
    pub label_warnings_ms: u64,
    /// `pair_adverse_events` / `single_adverse_events` timeout.
    pub adverse_events_ms: u64,
    /// Exposure-data fetch timeout.
    pub exposure_ms: u64,
    /// `literature_ai` timeout.
    pub literature_ai_ms: u64,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self {
            rxnorm_lookup_ms: 6_000,
            rxnorm_interactions_ms: 10_000,
            supplement_ms: 10_000,
            label_warnings_ms: 8_000,
            adverse_events_ms: 10_000,
            exposure_ms: 4_000,
            literature_ai_ms: 30_000,
        }
    }
}

/// Retry parameters for a single retryable provider (§4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first, so total attempts are
    /// `max_retries + 1`.
    pub max_retries: u32,
    /// Linear backoff base; attempt `n`'s delay is `backoff_base_ms * n`.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// No retries: a single attempt.
    #[must_use]
    pub const fn single_shot() -> Self {
        Self { max_retries: 0, backoff_base_ms: 0 }
    }

    /// `label_warnings`'s configured retry policy: 2 retries, 500ms linear
    /// backoff.
    #[must_use]
    pub const fn label_warnings() -> Self {
        Self { max_retries: 2, backoff_base_ms: 500 }
    }
}

/// The two independent concurrency limits (§4.2, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Max concurrent upstream provider calls.
    pub upstream: usize,
    /// Max concurrent pair-level computations.
    pub pair: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self { upstream: 6, pair: 3 }
    }
}

/// The complete typed pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Policy-bounded maximum item count per request (default 10).
    pub max_items: usize,
    /// Stamped on pair cache entries; changing it invalidates all prior
    /// pair entries.
    pub calc_version: String,
    /// Per-provider timeout table.
    pub timeouts: ProviderTimeouts,
    /// `label_warnings`'s retry policy; all other providers are
    /// single-shot.
    pub label_warnings_retry: RetryPolicy,
    /// The two independent concurrency limits.
    pub concurrency: ConcurrencyLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_items: 10,
            calc_version: "v1".to_string(),
            timeouts: ProviderTimeouts::default(),
            label_warnings_retry: RetryPolicy::label_warnings(),
            concurrency: ConcurrencyLimits::default(),
        }
    }
}

impl PipelineConfig {
    /// Validates internal consistency, failing closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_items` is zero, when
    /// `calc_version` is empty, or when either concurrency limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::Invalid("max_items must be greater than zero".to_string()));
        }
        if self.calc_version.is_empty() {
            return Err(ConfigError::Invalid("calc_version must not be empty".to_string()));
        }
        if self.concurrency.upstream == 0 || self.concurrency.pair == 0 {
            return Err(ConfigError::Invalid("concurrency limits must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_items, 10);
        assert_eq!(config.concurrency.upstream, 6);
        assert_eq!(config.concurrency.pair, 3);
        assert_eq!(config.timeouts.rxnorm_lookup_ms, 6_000);
        assert_eq!(config.timeouts.rxnorm_interactions_ms, 10_000);
        assert_eq!(config.timeouts.label_warnings_ms, 8_000);
        assert_eq!(config.timeouts.exposure_ms, 4_000);
        assert_eq!(config.timeouts.literature_ai_ms, 30_000);
        assert_eq!(config.label_warnings_retry.max_retries, 2);
        assert_eq!(config.label_warnings_retry.backoff_base_ms, 500);
    }

    #[test]
    fn zero_max_items_is_invalid() {
        let mut config = PipelineConfig::default();
        config.max_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_is_invalid() {
        let mut config = PipelineConfig::default();
        config.concurrency.pair = 0;
        assert!(config.validate().is_err());
    }
}
