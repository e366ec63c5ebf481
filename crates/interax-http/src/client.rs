//! The timed single-shot fetch and the bounded linear-backoff retry
//! wrapper around it (C3, §4.3).

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::HttpError;

/// Upper bound on a response body, mirroring the byte-limited reads the
/// teacher's provider HTTP layer enforces against untrusted upstreams.
pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Runs `attempt` once, cancelling it if it has not completed within
/// `timeout_duration`.
///
/// A timeout elapses into [`HttpError::Timeout`], distinct from a
/// transport-level failure; `tokio::time::timeout` drops the in-flight
/// future on elapse rather than merely ignoring its result.
pub async fn timed_fetch<F, Fut, T, E>(attempt: F, timeout_duration: Duration) -> Result<T, HttpError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(timeout_duration, attempt()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(HttpError::Transport(err.to_string())),
        Err(_elapsed) => Err(HttpError::Timeout),
    }
}

/// Attempts up to `max_retries + 1` calls with linear backoff
/// (`backoff_base * attempt_number`) between attempts. Every provider not
/// explicitly configured as retryable should call this with
/// `max_retries = 0`, which degenerates to a single timed attempt.
pub async fn fetch_with_retry<F, Fut, T, E>(
    mut attempt: F,
    timeout_duration: Duration,
    max_retries: u32,
    backoff_base: Duration,
) -> Result<T, HttpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let total_attempts = max_retries + 1;
    let mut last_error = HttpError::Transport("no attempt was made".to_string());
    for attempt_number in 1..=total_attempts {
        match timed_fetch(&mut attempt, timeout_duration).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                debug!(attempt_number, total_attempts, error = %err, "provider call attempt failed");
                last_error = err;
                if attempt_number < total_attempts {
                    tokio::time::sleep(backoff_base * attempt_number).await;
                }
            }
        }
    }
    Err(last_error)
}

/// Maps a non-2xx response onto [`HttpError::Transport`]; passes 2xx
/// through unchanged.
pub fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HttpError::Transport(format!("unexpected status: {status}")))
    }
}

/// Reads the response body, rejecting anything over `max_bytes` without
/// buffering unbounded attacker-controlled input.
///
/// # Errors
///
/// Returns [`HttpError::Transport`] if the declared or actual body size
/// exceeds `max_bytes`, or if the body cannot be read.
pub async fn read_body_limited(response: reqwest::Response, max_bytes: usize) -> Result<Vec<u8>, HttpError> {
    if let Some(declared) = response.content_length() {
        let max_bytes_u64 = u64::try_from(max_bytes).unwrap_or(u64::MAX);
        if declared > max_bytes_u64 {
            return Err(HttpError::Transport("response exceeds size limit".to_string()));
        }
    }
    let bytes = response.bytes().await.map_err(|err| HttpError::Transport(err.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(HttpError::Transport("response exceeds size limit".to_string()));
    }
    Ok(bytes.to_vec())
}

/// Decodes a JSON body into `T`, mapping failures onto [`HttpError::Parse`].
///
/// # Errors
///
/// Returns [`HttpError::Parse`] if `bytes` is not valid JSON for `T`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice(bytes).map_err(|err| HttpError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn timed_fetch_times_out_on_slow_future() {
        let result: Result<(), HttpError> = timed_fetch(
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<(), String>(())
            },
            Duration::from_millis(1),
        )
        .await;
        assert!(matches!(result, Err(HttpError::Timeout)));
    }

    #[tokio::test]
    async fn timed_fetch_passes_through_transport_error() {
        let result: Result<(), HttpError> =
            timed_fetch(|| async { Err::<(), String>("boom".to_string()) }, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(HttpError::Transport(msg)) if msg == "boom"));
    }

    #[tokio::test]
    async fn fetch_with_retry_stops_after_configured_attempts() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), HttpError> = fetch_with_retry(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), String>("always fails".to_string()) }
            },
            Duration::from_millis(50),
            2,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fetch_with_retry_returns_first_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, HttpError> = fetch_with_retry(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n < 1 { Err("not yet".to_string()) } else { Ok(42u32) } }
            },
            Duration::from_millis(50),
            2,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result.expect("should succeed on second attempt"), 42);
    }

    #[test]
    fn decode_json_reports_parse_error() {
        let result: Result<serde_json::Value, HttpError> = decode_json(b"not json");
        assert!(matches!(result, Err(HttpError::Parse(_))));
    }
}
