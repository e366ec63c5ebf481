// crates/interax-config/src/lib.rs
// ============================================================================
// Module: Interax Config
// Description: Typed pipeline configuration and environment credential
//              resolution.
// Purpose: Provide strict, fail-closed config for the orchestrator and CLI.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Configuration has two halves: [`pipeline::PipelineConfig`] (policy
//! bounds, timeouts, retries, concurrency limits — all pure data with
//! sensible defaults) and [`credentials::Credentials`] (environment-derived,
//! may fail closed on a missing required value).
//!
//! Invariants:
//! - [`credentials::Secret`] never reaches a `Debug`/`Display` impl in
//!   cleartext.
//! - An unset optional credential never fails configuration resolution; it
//!   only disables the provider that needs it.
//!
//! Security posture: credential values are untrusted-origin secrets handled
//! per the redaction guarantee above.

pub mod credentials;
pub mod error;
pub mod pipeline;

pub use credentials::{Credentials, Secret};
pub use error::ConfigError;
pub use pipeline::{ConcurrencyLimits, PipelineConfig, ProviderTimeouts, RetryPolicy};
