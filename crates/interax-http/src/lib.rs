// crates/interax-http/src/lib.rs
// ============================================================================
// Module: Interax HTTP
// Description: Timed fetch and bounded retry wrapper shared by every
//              provider adapter.
// Purpose: Give providers one place that owns timeout/retry/parse policy.
// Dependencies: reqwest, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! `client` provides the timed single-shot fetch and the linear-backoff
//! retry wrapper around it (C3). Timeouts are distinct from transport
//! errors (`error::HttpError`); retries are opt-in per call, not global.
//!
//! Security posture: response bodies are untrusted and are read through
//! [`client::read_body_limited`], which rejects anything over
//! [`client::MAX_RESPONSE_BYTES`].

pub mod client;
pub mod error;

pub use client::{decode_json, ensure_success, fetch_with_retry, read_body_limited, timed_fetch, MAX_RESPONSE_BYTES};
pub use error::HttpError;
