// crates/interax-orchestrator/tests/pipeline_round_trip.rs
// ============================================================================
// Round-trip tests for `Pipeline::analyze` against local mock providers.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "test setup and assertions are exempt from the workspace's production-code lints"
)]

use std::thread;

use interax_config::{Credentials, PipelineConfig, Secret};
use interax_core::Severity;
use interax_orchestrator::{AnalyzeOptions, AnalyzeRequest, Pipeline};
use interax_providers::ProviderEndpoints;
use interax_store_sqlite::{SqliteStoreConfig, SqliteStoreMode};
use tiny_http::{Response, Server};

/// A JSON body valid against every provider's response shape this crate
/// parses (`idGroup`, `meta.results.total`, `results`), all empty, so every
/// provider call degrades cleanly to "not found" with a single request.
const EMPTY_BODY: &str = r#"{"idGroup":{},"meta":{"results":{"total":0}},"results":[]}"#;

/// Starts a local server that answers every request it receives with
/// [`EMPTY_BODY`] and a 200 status until the listener is dropped.
fn empty_response_server() -> String {
    let server = Server::http("127.0.0.1:0").expect("bind local server");
    let addr = server.server_addr().to_ip().expect("ip address");
    thread::spawn(move || {
        while let Ok(request) = server.recv() {
            let response = Response::from_string(EMPTY_BODY)
                .with_header("Content-Type: application/json".parse::<tiny_http::Header>().expect("valid header"));
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}")
}

/// Builds a pipeline wired entirely to local, credential-free collaborators:
/// both RxNorm/openFDA endpoints point at a mock server, the supplement and
/// literature_ai credentials are absent so those providers are skipped, and
/// the store is a fresh temp-directory SQLite file.
fn test_pipeline(base_url: &str, dir: &tempfile::TempDir) -> Pipeline {
    let endpoints = ProviderEndpoints {
        rxnorm_base_url: base_url.to_string(),
        openfda_base_url: base_url.to_string(),
        cms_base_url: base_url.to_string(),
        ..ProviderEndpoints::default()
    };
    let credentials =
        Credentials { database_url: Secret::new("unused".to_string()), supplement_api_key: None, literature_ai_api_key: None, debug_enabled: false };
    let store_config = SqliteStoreConfig { path: dir.path().join("interax-test.sqlite3"), busy_timeout_ms: 5_000, journal_mode: SqliteStoreMode::Wal };
    Pipeline::new(PipelineConfig::default(), credentials, endpoints, &store_config).expect("build pipeline")
}

#[tokio::test]
async fn analyze_produces_one_report_per_arity_for_three_items() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest {
        items: vec!["warfarin".to_string(), "ibuprofen".to_string(), "aspirin".to_string()],
        options: None,
    };
    let response = pipeline.analyze(request).await.expect("analyze succeeds");

    assert_eq!(response.items.len(), 3);
    assert_eq!(response.results.singles.len(), 3);
    assert_eq!(response.results.pairs.len(), 3);
    assert_eq!(response.results.triples.len(), 1);
    assert!(response.debug.is_none());
    for pair in &response.results.pairs {
        assert_eq!(pair.severity, Severity::Unknown);
    }
}

#[tokio::test]
async fn analyze_populates_the_debug_trace_when_requested() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest {
        items: vec!["warfarin".to_string(), "ibuprofen".to_string()],
        options: Some(AnalyzeOptions { debug: Some(true), ..AnalyzeOptions::default() }),
    };
    let response = pipeline.analyze(request).await.expect("analyze succeeds");

    let debug = response.debug.expect("debug trace present");
    assert!(!debug.is_empty());
}

#[tokio::test]
async fn debug_trace_marks_skipped_rxnorm_interactions_as_not_attempted() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest {
        items: vec!["warfarin".to_string(), "ibuprofen".to_string()],
        options: Some(AnalyzeOptions { debug: Some(true), ..AnalyzeOptions::default() }),
    };
    let response = pipeline.analyze(request).await.expect("analyze succeeds");

    let debug = response.debug.expect("debug trace present");
    let rxnorm_entry = debug
        .iter()
        .find(|entry| entry.provider == "rxnorm_interactions")
        .expect("rxnorm_interactions entry present");
    assert!(!rxnorm_entry.status.attempted, "rxnorm lookup never resolved an id against the mock server, so the pair call is skipped");
}

#[tokio::test]
async fn include_cms_false_skips_the_exposure_fetch() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest {
        items: vec!["warfarin".to_string()],
        options: Some(AnalyzeOptions { debug: Some(true), include_cms: Some(false), ..AnalyzeOptions::default() }),
    };
    let response = pipeline.analyze(request).await.expect("analyze succeeds");

    let debug = response.debug.expect("debug trace present");
    let exposure_entry = debug.iter().find(|entry| entry.provider == "cms_exposure").expect("cms_exposure entry present");
    assert!(!exposure_entry.status.attempted);
}

#[tokio::test]
async fn analyze_rejects_an_empty_item() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest { items: vec!["warfarin".to_string(), String::new()], options: None };
    assert!(pipeline.analyze(request).await.is_err());
}

#[tokio::test]
async fn analyze_second_call_hits_the_item_and_pair_caches() {
    let base_url = empty_response_server();
    let dir = tempfile::tempdir().expect("create temp dir");
    let pipeline = test_pipeline(&base_url, &dir);

    let request = AnalyzeRequest { items: vec!["warfarin".to_string(), "ibuprofen".to_string()], options: None };
    let first = pipeline.analyze(request.clone()).await.expect("first analyze succeeds");
    let second = pipeline.analyze(request).await.expect("second analyze succeeds");

    assert_eq!(first.results.pairs.len(), second.results.pairs.len());
    assert!(second.meta.cache_stats.item_hits > 0 || second.meta.cache_stats.pair_hits > 0);
}
