//! HTTP-layer error taxonomy (§7): a timeout is distinct from a transport
//! failure, and both are distinct from a response the adapter could not
//! parse.

use thiserror::Error;

/// Errors produced by the timed fetch and retry wrapper.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The call did not complete within its configured timeout. Distinct
    /// from [`HttpError::Transport`] — a timeout cancels the in-flight
    /// request rather than merely ignoring it (§9).
    #[error("request timed out")]
    Timeout,
    /// A non-2xx status or a lower-level transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}
