//! Configuration loading and validation errors.

use thiserror::Error;

/// Errors raised while resolving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent or empty.
    #[error("missing required environment variable: {0}")]
    MissingRequired(String),
    /// A configuration value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}
