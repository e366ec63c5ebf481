// crates/interax-cli/src/main.rs
// ============================================================================
// Module: Interax CLI Entry Point
// Description: Command dispatcher for running analyze requests against the
//   interax pipeline from the command line.
// Purpose: Provide a local, scriptable front end for the orchestrator
//   without standing up an HTTP server.
// Dependencies: clap, interax-config, interax-core, interax-orchestrator,
//   interax-providers, interax-store-sqlite, serde_json, thiserror, tokio,
//   tracing, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The `interax` binary reads an [`interax_orchestrator::AnalyzeRequest`]
//! as JSON, either from a file or from stdin, runs it through
//! [`interax_orchestrator::Pipeline::analyze`], and writes the JSON
//! response to stdout or a file. Credentials are always read from the
//! process environment (§4.11); every other setting has a CLI flag with a
//! default matching the pipeline's own defaults.

use std::fs;
use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use interax_config::{Credentials, PipelineConfig};
use interax_core::PipelineError;
use interax_orchestrator::{AnalyzeRequest, Pipeline};
use interax_providers::ProviderEndpoints;
use interax_store_sqlite::{SqliteStoreConfig, SqliteStoreMode};
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "interax", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one analyze request and prints its JSON response.
    Analyze(AnalyzeCommand),
}

/// `SQLite` cache location shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Path to the `SQLite` cache database.
    #[arg(long, value_name = "PATH", default_value = "interax.sqlite3")]
    store_path: PathBuf,
    /// Busy timeout for the `SQLite` connection, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 5_000)]
    busy_timeout_ms: u64,
}

/// Upstream endpoint overrides shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct EndpointArgs {
    /// Overrides the supplement-interaction authority base URL.
    #[arg(long, value_name = "URL")]
    supplement_base_url: Option<String>,
    /// Overrides the `literature_ai` synthesis endpoint base URL.
    #[arg(long, value_name = "URL")]
    literature_ai_base_url: Option<String>,
    /// Overrides the CMS exposure-data base URL.
    #[arg(long, value_name = "URL")]
    cms_base_url: Option<String>,
}

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
struct AnalyzeCommand {
    /// Path to the analyze request JSON; reads stdin when omitted.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Output path for the response JSON; writes stdout when omitted.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Forces the request's debug trace on, overriding the credential
    /// default.
    #[arg(long)]
    debug: bool,
    /// Bypasses every cache read for this request.
    #[arg(long)]
    force_refresh: bool,
    /// Disables `literature_ai` for this request, overriding the request
    /// body's own `includeAi` option.
    #[arg(long)]
    no_ai: bool,
    /// Disables the CMS exposure fetch for this request, overriding the
    /// request body's own `includeCms` option.
    #[arg(long)]
    no_cms: bool,
    /// Overrides the pipeline's maximum item count per request.
    #[arg(long, value_name = "COUNT")]
    max_items: Option<usize>,
    /// Overrides the pair-cache `calc_version` stamp.
    #[arg(long, value_name = "VERSION")]
    calc_version: Option<String>,
    /// `SQLite` cache location.
    #[command(flatten)]
    store: StoreArgs,
    /// Upstream endpoint overrides.
    #[command(flatten)]
    endpoints: EndpointArgs,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper unifying every fallible step behind one message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Parses arguments and dispatches the selected subcommand.
async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(command) => command_analyze(command).await,
    }
}

// ============================================================================
// SECTION: Analyze Command
// ============================================================================

/// Executes the `analyze` command: builds a pipeline from the environment
/// and the given flags, runs one request, and writes its response.
async fn command_analyze(command: AnalyzeCommand) -> CliResult<()> {
    let request = load_request(command.input.as_deref())?;
    tracing::info!(item_count = request.items.len(), "starting analyze request");
    let credentials = Credentials::from_env().map_err(|err| CliError::new(err.to_string()))?;
    let endpoints = build_endpoints(&command.endpoints);
    let config = build_pipeline_config(command.max_items, command.calc_version);
    let store_config = SqliteStoreConfig {
        path: command.store.store_path,
        busy_timeout_ms: command.store.busy_timeout_ms,
        journal_mode: SqliteStoreMode::Wal,
    };

    let pipeline = Pipeline::new(config, credentials, endpoints, &store_config)?;
    let request = apply_overrides(request, command.debug, command.force_refresh, command.no_ai, command.no_cms);
    let response = pipeline.analyze(request).await?;
    let payload = serde_json::to_string_pretty(&response).map_err(|err| CliError::new(format!("failed to serialize response: {err}")))?;
    write_output(command.output.as_deref(), &payload)
}

/// Reads and parses the analyze request from `path`, or from stdin when
/// `path` is absent.
fn load_request(path: Option<&std::path::Path>) -> CliResult<AnalyzeRequest> {
    let raw = match path {
        Some(path) => fs::read_to_string(path).map_err(|err| CliError::new(format!("failed to read '{}': {err}", path.display())))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).map_err(|err| CliError::new(format!("failed to read stdin: {err}")))?;
            buffer
        }
    };
    serde_json::from_str(&raw).map_err(|err| CliError::new(format!("invalid analyze request JSON: {err}")))
}

/// Applies `--debug` / `--force-refresh` / `--no-ai` / `--no-cms` CLI
/// overrides on top of whatever the request body itself specified.
fn apply_overrides(mut request: AnalyzeRequest, debug: bool, force_refresh: bool, no_ai: bool, no_cms: bool) -> AnalyzeRequest {
    if !debug && !force_refresh && !no_ai && !no_cms {
        return request;
    }
    let mut options = request.options.unwrap_or_default();
    if debug {
        options.debug = Some(true);
    }
    if force_refresh {
        options.force_refresh = true;
    }
    if no_ai {
        options.include_ai = Some(false);
    }
    if no_cms {
        options.include_cms = Some(false);
    }
    request.options = Some(options);
    request
}

/// Builds [`ProviderEndpoints`], applying any CLI overrides on top of the
/// built-in defaults.
fn build_endpoints(args: &EndpointArgs) -> ProviderEndpoints {
    let mut endpoints = ProviderEndpoints::default();
    if let Some(url) = &args.supplement_base_url {
        endpoints.supplement_base_url = url.clone();
    }
    if let Some(url) = &args.literature_ai_base_url {
        endpoints.literature_ai_base_url = url.clone();
    }
    if let Some(url) = &args.cms_base_url {
        endpoints.cms_base_url = url.clone();
    }
    endpoints
}

/// Builds [`PipelineConfig`], applying any CLI overrides on top of the
/// built-in defaults.
fn build_pipeline_config(max_items: Option<usize>, calc_version: Option<String>) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if let Some(max_items) = max_items {
        config.max_items = max_items;
    }
    if let Some(calc_version) = calc_version {
        config.calc_version = calc_version;
    }
    config
}

/// Writes `payload` to `path`, or to stdout when `path` is absent.
fn write_output(path: Option<&std::path::Path>, payload: &str) -> CliResult<()> {
    match path {
        Some(path) => fs::write(path, payload).map_err(|err| CliError::new(format!("failed to write '{}': {err}", path.display()))),
        None => write_stdout_line(payload).map_err(|err| CliError::new(format!("failed to write stdout: {err}"))),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout, bypassing the `print!`/`println!` lint
/// surface.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes one line to stderr, bypassing the `print!`/`println!` lint
/// surface.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::time::{SystemTime, UNIX_EPOCH};

    use interax_orchestrator::AnalyzeOptions;

    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("clock drift").as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("interax-cli-{label}-{nanos}.json"));
        fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn load_request_reads_a_valid_file() {
        let path = temp_file("valid", r#"{"items": ["warfarin", "aspirin"]}"#);
        let request = load_request(Some(&path)).expect("parse request");
        assert_eq!(request.items, vec!["warfarin".to_string(), "aspirin".to_string()]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_request_rejects_invalid_json() {
        let path = temp_file("invalid", "not json");
        assert!(load_request(Some(&path)).is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_request_rejects_a_missing_file() {
        let mut path = std::env::temp_dir();
        path.push("interax-cli-missing-request-does-not-exist.json");
        assert!(load_request(Some(&path)).is_err());
    }

    #[test]
    fn apply_overrides_is_a_no_op_when_nothing_is_set() {
        let request = AnalyzeRequest { items: vec!["warfarin".to_string()], options: None };
        let result = apply_overrides(request.clone(), false, false, false, false);
        assert_eq!(result, request);
    }

    #[test]
    fn apply_overrides_sets_debug_without_disturbing_force_refresh() {
        let request = AnalyzeRequest {
            items: vec!["warfarin".to_string()],
            options: Some(AnalyzeOptions { force_refresh: true, ..AnalyzeOptions::default() }),
        };
        let result = apply_overrides(request, true, false, false, false);
        let options = result.options.expect("options");
        assert_eq!(options.debug, Some(true));
        assert!(options.force_refresh);
    }

    #[test]
    fn apply_overrides_disables_ai_and_cms_independently() {
        let request = AnalyzeRequest { items: vec!["warfarin".to_string()], options: None };
        let result = apply_overrides(request, false, false, true, true);
        let options = result.options.expect("options");
        assert_eq!(options.include_ai, Some(false));
        assert_eq!(options.include_cms, Some(false));
    }

    #[test]
    fn build_endpoints_overrides_only_the_given_urls() {
        let args = EndpointArgs {
            supplement_base_url: Some("https://example.invalid".to_string()),
            literature_ai_base_url: None,
            cms_base_url: None,
        };
        let endpoints = build_endpoints(&args);
        assert_eq!(endpoints.supplement_base_url, "https://example.invalid");
        assert_eq!(endpoints.literature_ai_base_url, ProviderEndpoints::default().literature_ai_base_url);
        assert_eq!(endpoints.cms_base_url, ProviderEndpoints::default().cms_base_url);
    }

    #[test]
    fn build_pipeline_config_overrides_only_the_given_fields() {
        let config = build_pipeline_config(Some(3), None);
        assert_eq!(config.max_items, 3);
        assert_eq!(config.calc_version, PipelineConfig::default().calc_version);
    }
}
