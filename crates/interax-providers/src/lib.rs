// crates/interax-providers/src/lib.rs
// ============================================================================
// Module: Interax Providers
// Description: One async adapter per upstream authority.
// Purpose: Isolate every upstream's quirks behind a uniform
//          ProviderOutcome<T> so the orchestrator never special-cases a
//          provider family.
// Dependencies: interax-config, interax-http, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Seven adapters: [`rxnorm`] (rxnorm_lookup, rxnorm_interactions),
//! [`supplement`] (supplement_lookup, supplement_interactions), [`label`]
//! (label_warnings), [`adverse_events`] (pair_adverse_events,
//! single_adverse_events), [`literature_ai`], and [`exposure`]
//! (cms_exposure). Every adapter returns [`outcome::ProviderOutcome`], so
//! "looked, found nothing" never collides with "the call failed" (§4.4).
//!
//! Invariants:
//! - A missing optional credential always yields
//!   [`outcome::ProviderError::MissingCredential`], never a request
//!   failure.
//! - `label_warnings` never returns a warning whose primary ingredient
//!   differs from the queried item (§4.4).
//!
//! Security posture: every response body is read through
//! `interax_http::read_body_limited`; API credentials are handled as
//! [`interax_config::Secret`] and never logged.

pub mod adverse_events;
pub mod endpoints;
pub mod exposure;
pub mod label;
pub mod literature_ai;
pub mod outcome;
pub mod rxnorm;
pub mod supplement;

pub use adverse_events::{pair_adverse_events, single_adverse_events, AdverseEventResult};
pub use endpoints::ProviderEndpoints;
pub use exposure::{cms_exposure, CmsExposureResult};
pub use label::{label_warnings, LabelWarningsResult, NSAID_CLASS_TABLE};
pub use literature_ai::{literature_ai, LiteratureAiFinding};
pub use outcome::{ProviderError, ProviderOutcome};
pub use rxnorm::{rxnorm_interactions, rxnorm_lookup, RxnormInteractionResult};
pub use supplement::{supplement_interactions, supplement_lookup, SupplementInteractionFinding};
