//! The `Pipeline`: the six-step analyze flow (§6) — normalize, item phase,
//! pair phase, single phase, triple phase, assembly.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use interax_config::{Credentials, PipelineConfig};
use interax_core::{
    ConcurrencyLimiter, DenominatorMethod, EvidenceRecord, NormalizedItem, Origin, PairReport, PipelineError,
    ProviderStatus, Severity, SingleReport, Timestamp, TripleReport,
};
use interax_providers::{ProviderEndpoints, ProviderError, ProviderOutcome};
use interax_store_sqlite::{
    ExposureEntry, ExposureStore, ItemCacheEntry, ItemStore, PairStore, SqliteStoreConfig, StoreError, UsageLogEntry,
    UsageLogStore,
};
use tokio::task::JoinSet;

use crate::request::AnalyzeRequest;
use crate::response::{AnalyzeResponse, AnalyzeResults, CacheStats, ProviderDebugEntry, ResponseMeta, TimingMeta};

/// Converts a store-layer failure into the orchestrator's aggregate error.
///
/// `interax-orchestrator` cannot implement `From<StoreError> for
/// PipelineError` directly (both types are foreign to this crate), so
/// call sites use this free function at the `?` boundary instead.
fn store_err_to_pipeline(err: StoreError) -> PipelineError {
    PipelineError::CacheFailure(err.to_string())
}

/// Milliseconds elapsed since `start`, saturating rather than truncating.
fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Builds a [`ProviderStatus`] for a provider whose normalized "found
/// nothing" result is still a success — the interaction- and
/// count-reporting providers (§4.10).
fn build_interaction_status<T>(outcome: &ProviderOutcome<T>, elapsed_ms: u64, cached: bool) -> ProviderStatus {
    match outcome {
        ProviderOutcome::Found(_) | ProviderOutcome::NotFound => {
            ProviderStatus { attempted: true, ok: true, elapsed_ms, cached, error: None }
        }
        ProviderOutcome::Err(err) => ProviderStatus { attempted: true, ok: false, elapsed_ms, cached, error: Some(err.to_string()) },
    }
}

/// Builds a [`ProviderStatus`] for an identifier-lookup provider, for which
/// an absent identifier is itself a failure to resolve the item (§4.10).
fn build_lookup_status<T>(outcome: &ProviderOutcome<T>, elapsed_ms: u64, cached: bool) -> ProviderStatus {
    match outcome {
        ProviderOutcome::Found(_) => ProviderStatus { attempted: true, ok: true, elapsed_ms, cached, error: None },
        ProviderOutcome::NotFound => ProviderStatus { attempted: true, ok: false, elapsed_ms, cached, error: None },
        ProviderOutcome::Err(err) => ProviderStatus { attempted: true, ok: false, elapsed_ms, cached, error: Some(err.to_string()) },
    }
}

/// Builds a [`ProviderStatus`] for a provider that was cleanly skipped —
/// an absent identifier, a missing credential, or a disabled request
/// option — rather than attempted and failed.
fn skipped_status() -> ProviderStatus {
    ProviderStatus { attempted: false, ok: false, elapsed_ms: 0, cached: false, error: None }
}

/// The per-item result carried from the item phase into the pair and
/// single phases: resolved identifiers, the standardized label-warning
/// record (if any), and the cached exposure estimate.
#[derive(Debug, Clone)]
struct ItemOutcome {
    /// The item's normalized and original spelling.
    normalized: NormalizedItem,
    /// Resolved `RxNorm` identifier, if any.
    rxnorm_id: Option<String>,
    /// Resolved supplement-catalog identifier, if any.
    supplement_id: Option<String>,
    /// Standardized `Origin::LabelWarnings` evidence, if any warnings exist.
    label_record: Option<EvidenceRecord>,
    /// Cached beneficiary-exposure estimate, if known.
    beneficiaries: Option<u64>,
    /// Item-cache field hits recorded while resolving this item.
    cache_hits: u64,
    /// Item-cache field misses recorded while resolving this item.
    cache_misses: u64,
    /// Provider debug entries recorded while resolving this item.
    debug: Vec<ProviderDebugEntry>,
}

/// The per-pair result carried out of the pair phase.
#[derive(Debug, Clone)]
struct PairOutcome {
    /// The computed or cached pair report.
    report: PairReport,
    /// Whether `report` came from the pair cache.
    cache_hit: bool,
    /// Provider debug entries recorded while computing this pair, empty on
    /// a cache hit.
    debug: Vec<ProviderDebugEntry>,
}

/// The six-step analyze pipeline (§6), holding every collaborator it needs:
/// the shared HTTP client, upstream endpoint configuration, resolved
/// credentials, policy configuration, the four SQLite-backed stores (all
/// sharing one connection), and the two independent concurrency limiters.
#[derive(Clone)]
pub struct Pipeline {
    /// Shared HTTP client reused across every provider call.
    http_client: reqwest::Client,
    /// Upstream base URLs.
    endpoints: ProviderEndpoints,
    /// Resolved environment credentials.
    credentials: Credentials,
    /// Policy configuration: timeouts, retry policy, concurrency limits,
    /// item bound, and `calc_version`.
    config: PipelineConfig,
    /// Per-item identifier and label-warning cache.
    item_store: ItemStore,
    /// Per-pair, per-`calc_version` report cache.
    pair_store: PairStore,
    /// Per-item beneficiary-exposure cache.
    exposure_store: ExposureStore,
    /// Append-only usage log.
    usage_log: UsageLogStore,
    /// Bounds concurrent upstream provider calls, shared across all phases.
    upstream_limiter: ConcurrencyLimiter,
    /// Bounds concurrent pair-level computations.
    pair_limiter: ConcurrencyLimiter,
    /// Source of process-local, best-effort unique usage-log ids.
    request_counter: Arc<AtomicU64>,
}

impl Pipeline {
    /// Builds a pipeline: validates `config`, opens the shared SQLite
    /// connection, and wires up every store and limiter.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when `config` fails
    /// validation, or [`PipelineError::CacheFailure`] when the database
    /// cannot be opened.
    pub fn new(
        config: PipelineConfig,
        credentials: Credentials,
        endpoints: ProviderEndpoints,
        store_config: &SqliteStoreConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(|err| PipelineError::InvalidInput(err.to_string()))?;
        let connection = interax_store_sqlite::open(store_config).map_err(store_err_to_pipeline)?;
        let connection = Arc::new(Mutex::new(connection));
        let item_store = ItemStore::new(Arc::clone(&connection));
        let pair_store = PairStore::new(Arc::clone(&connection));
        let exposure_store = ExposureStore::new(Arc::clone(&connection));
        let usage_log = UsageLogStore::new(connection);
        let http_client = reqwest::Client::builder().build().map_err(|err| PipelineError::Internal(err.to_string()))?;
        let upstream_limiter = ConcurrencyLimiter::new(config.concurrency.upstream);
        let pair_limiter = ConcurrencyLimiter::new(config.concurrency.pair);
        Ok(Self {
            http_client,
            endpoints,
            credentials,
            config,
            item_store,
            pair_store,
            exposure_store,
            usage_log,
            upstream_limiter,
            pair_limiter,
            request_counter: Arc::new(AtomicU64::new(0)),
        })
    }

    /// A best-effort, process-local, monotonically increasing request id
    /// for the usage log (§4.5). Not a global uniqueness guarantee across
    /// restarts; a resulting primary-key collision is swallowed like any
    /// other usage-log write failure.
    fn next_request_id(&self) -> String {
        let sequence = self.request_counter.fetch_add(1, Ordering::Relaxed);
        format!("req-{sequence}")
    }

    /// Runs the complete six-step pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when the request fails
    /// validation or normalization, [`PipelineError::CacheFailure`] when a
    /// cache read fails, and [`PipelineError::Internal`] on an unexpected
    /// internal failure. Provider call failures never surface here; they
    /// degrade the affected evidence to absent and, in debug mode, appear
    /// in the response's `debug` trace.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, PipelineError> {
        let total_start = Instant::now();
        request.validate_values()?;
        let items = interax_core::normalize_items(&request.items, self.config.max_items)?;
        let force_refresh = request.force_refresh();
        let debug_enabled = request.debug_enabled(self.credentials.debug_enabled);
        let include_ai = request.include_ai();
        let include_cms = request.include_cms();
        tracing::info!(item_count = items.len(), force_refresh, debug_enabled, include_ai, include_cms, "analyze request starting");

        let item_phase_start = Instant::now();
        let item_outcomes = self.run_item_phase(&items, force_refresh, debug_enabled, include_cms).await?;
        let item_phase_ms = elapsed_ms(item_phase_start);
        tracing::debug!(item_phase_ms, "item phase complete");

        let mut cache_stats = CacheStats::default();
        let mut debug_entries = Vec::new();
        for outcome in &item_outcomes {
            cache_stats.item_hits += outcome.cache_hits;
            cache_stats.item_misses += outcome.cache_misses;
            if outcome.beneficiaries.is_some() {
                cache_stats.exposure_hits += 1;
            } else {
                cache_stats.exposure_misses += 1;
            }
            if debug_enabled {
                debug_entries.extend(outcome.debug.clone());
            }
        }

        let pair_phase_start = Instant::now();
        let pair_index = interax_core::enumerate_pairs(&items);
        let pair_reports =
            self.run_pair_phase(&pair_index, &item_outcomes, force_refresh, debug_enabled, include_ai, &mut cache_stats, &mut debug_entries).await?;
        let pair_phase_ms = elapsed_ms(pair_phase_start);
        tracing::debug!(pair_phase_ms, pair_count = pair_reports.len(), "pair phase complete");

        let single_phase_start = Instant::now();
        let singles = self.run_single_phase(&items, &item_outcomes, debug_enabled, &mut debug_entries).await?;
        let single_phase_ms = elapsed_ms(single_phase_start);
        tracing::debug!(single_phase_ms, single_count = singles.len(), "single phase complete");

        let triple_phase_start = Instant::now();
        let triple_index = interax_core::enumerate_triples(&items);
        let triples = run_triple_phase(&items, &triple_index, &pair_index, &pair_reports)?;
        let triple_phase_ms = elapsed_ms(triple_phase_start);
        tracing::debug!(triple_phase_ms, triple_count = triples.len(), "triple phase complete");

        let total_ms = elapsed_ms(total_start);
        let max_severity = pair_reports
            .iter()
            .map(|report| report.severity)
            .chain(singles.iter().map(|report| report.severity))
            .chain(triples.iter().map(|report| report.severity))
            .max();
        let summary_json = serde_json::json!({
            "maxSeverity": max_severity.map(|severity| severity.to_string()),
            "pairCount": pair_reports.len(),
            "singleCount": singles.len(),
            "tripleCount": triples.len(),
        });
        let cache_hits_json = serde_json::json!({
            "itemHits": cache_stats.item_hits,
            "itemMisses": cache_stats.item_misses,
            "pairHits": cache_stats.pair_hits,
            "pairMisses": cache_stats.pair_misses,
            "exposureHits": cache_stats.exposure_hits,
            "exposureMisses": cache_stats.exposure_misses,
        });

        let response = AnalyzeResponse {
            items: items.clone(),
            results: AnalyzeResults { singles, pairs: pair_reports, triples },
            meta: ResponseMeta {
                calc_version: self.config.calc_version.clone(),
                cache_stats,
                timing: TimingMeta { total_ms, item_phase_ms, pair_phase_ms, single_phase_ms, triple_phase_ms },
            },
            debug: debug_enabled.then_some(debug_entries),
        };

        self.usage_log.append(&UsageLogEntry {
            id: self.next_request_id(),
            created_at: Timestamp::now(),
            items: request.items.clone(),
            summary: summary_json,
            latency_ms: total_ms,
            cache_hits: cache_hits_json,
        });
        let max_severity_label = max_severity.map_or_else(|| "none".to_string(), |severity| severity.to_string());
        tracing::info!(total_ms, max_severity = %max_severity_label, "analyze request complete");

        Ok(response)
    }

    /// Fetches every item's identifiers, label warnings, and exposure
    /// estimate concurrently, bounded only by the shared upstream limiter.
    async fn run_item_phase(
        &self,
        items: &[NormalizedItem],
        force_refresh: bool,
        debug_enabled: bool,
        include_cms: bool,
    ) -> Result<Vec<ItemOutcome>, PipelineError> {
        let mut tasks = JoinSet::new();
        for item in items {
            let pipeline = self.clone();
            let item = item.clone();
            tasks.spawn(async move { pipeline.fetch_item(item, force_refresh, debug_enabled, include_cms).await });
        }
        let mut by_normalized: HashMap<String, ItemOutcome> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|err| PipelineError::Internal(err.to_string()))??;
            by_normalized.insert(outcome.normalized.normalized.clone(), outcome);
        }
        items
            .iter()
            .map(|item| by_normalized.remove(&item.normalized).ok_or_else(|| PipelineError::Internal("item outcome missing after phase".to_string())))
            .collect()
    }

    /// Computes every pair's report concurrently, bounded by both the pair
    /// limiter (outer) and the upstream limiter (inner, per provider call).
    async fn run_pair_phase(
        &self,
        pair_index: &[(usize, usize)],
        item_outcomes: &[ItemOutcome],
        force_refresh: bool,
        debug_enabled: bool,
        include_ai: bool,
        cache_stats: &mut CacheStats,
        debug_entries: &mut Vec<ProviderDebugEntry>,
    ) -> Result<Vec<PairReport>, PipelineError> {
        let mut tasks = JoinSet::new();
        for &(i, j) in pair_index {
            let pipeline = self.clone();
            let a = item_outcomes[i].clone();
            let b = item_outcomes[j].clone();
            tasks.spawn(async move {
                let result = pipeline.pair_limiter.run(pipeline.fetch_pair(&a, &b, force_refresh, debug_enabled, include_ai)).await;
                (i, j, result)
            });
        }
        let mut by_index: HashMap<(usize, usize), PairReport> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (i, j, limiter_result) = joined.map_err(|err| PipelineError::Internal(err.to_string()))?;
            let outcome = limiter_result.map_err(PipelineError::from)??;
            cache_stats.pair_hits += u64::from(outcome.cache_hit);
            cache_stats.pair_misses += u64::from(!outcome.cache_hit);
            if debug_enabled {
                debug_entries.extend(outcome.debug);
            }
            by_index.insert((i, j), outcome.report);
        }
        pair_index
            .iter()
            .map(|key| by_index.remove(key).ok_or_else(|| PipelineError::Internal("pair report missing after phase".to_string())))
            .collect()
    }

    /// Computes every item's standalone report concurrently, bounded by the
    /// shared upstream limiter.
    async fn run_single_phase(
        &self,
        items: &[NormalizedItem],
        item_outcomes: &[ItemOutcome],
        debug_enabled: bool,
        debug_entries: &mut Vec<ProviderDebugEntry>,
    ) -> Result<Vec<SingleReport>, PipelineError> {
        let mut tasks = JoinSet::new();
        for outcome in item_outcomes {
            let pipeline = self.clone();
            let outcome = outcome.clone();
            tasks.spawn(async move {
                let key = outcome.normalized.normalized.clone();
                let result = pipeline.fetch_single(&outcome, debug_enabled).await;
                (key, result)
            });
        }
        let mut by_normalized: HashMap<String, (SingleReport, Vec<ProviderDebugEntry>)> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (key, result) = joined.map_err(|err| PipelineError::Internal(err.to_string()))?;
            by_normalized.insert(key, result?);
        }
        items
            .iter()
            .map(|item| {
                let (report, debug) = by_normalized
                    .remove(&item.normalized)
                    .ok_or_else(|| PipelineError::Internal("single report missing after phase".to_string()))?;
                if debug_enabled {
                    debug_entries.extend(debug);
                }
                Ok(report)
            })
            .collect()
    }

    /// Resolves one item's identifiers, label warnings, and exposure
    /// estimate, reading the item cache first and persisting any freshly
    /// fetched fields back to it.
    async fn fetch_item(&self, item: NormalizedItem, force_refresh: bool, debug_enabled: bool, include_cms: bool) -> Result<ItemOutcome, PipelineError> {
        let now = Timestamp::now();
        let read = self.item_store.get(&item.normalized, force_refresh, now).map_err(store_err_to_pipeline)?;
        let mut cache_hits = 0u64;
        let mut cache_misses = 0u64;
        let mut debug = Vec::new();

        let mut rxnorm_id = read.entry.as_ref().and_then(|entry| entry.rxnorm_id.clone());
        let need_rxnorm = read.entry.is_none() || (rxnorm_id.is_none() && read.stale_rxnorm);
        if need_rxnorm {
            cache_misses += 1;
            let timeout = Duration::from_millis(self.config.timeouts.rxnorm_lookup_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::rxnorm_lookup(&self.http_client, &self.endpoints, &item.normalized, timeout))
                .await
                .map_err(PipelineError::from)?;
            let status = build_lookup_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "rxnorm_lookup", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: item.original.clone(), item_b: None, provider: "rxnorm_lookup".to_string(), status });
            }
            rxnorm_id = outcome.found().cloned();
        } else {
            cache_hits += 1;
        }

        let mut supplement_id = read.entry.as_ref().and_then(|entry| entry.supplement_id.clone());
        let need_supplement = read.entry.is_none() || (supplement_id.is_none() && read.stale_supplement);
        if need_supplement {
            cache_misses += 1;
            if self.credentials.has_supplement_key() {
                let timeout = Duration::from_millis(self.config.timeouts.supplement_ms);
                let start = Instant::now();
                let outcome = self
                    .upstream_limiter
                    .run(interax_providers::supplement_lookup(
                        &self.http_client,
                        &self.endpoints,
                        self.credentials.supplement_api_key.as_ref(),
                        &item.normalized,
                        timeout,
                    ))
                    .await
                    .map_err(PipelineError::from)?;
                let status = build_lookup_status(&outcome, elapsed_ms(start), false);
                tracing::debug!(provider = "supplement_lookup", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
                if debug_enabled {
                    debug.push(ProviderDebugEntry { item_a: item.original.clone(), item_b: None, provider: "supplement_lookup".to_string(), status });
                }
                supplement_id = outcome.found().cloned();
            }
        } else {
            cache_hits += 1;
        }

        let mut label_result = read.entry.as_ref().and_then(|entry| entry.label_warnings.clone());
        let need_label = read.entry.is_none() || (label_result.is_none() && read.stale_label);
        if need_label {
            cache_misses += 1;
            let retry = self.config.label_warnings_retry;
            let timeout = Duration::from_millis(self.config.timeouts.label_warnings_ms);
            let backoff_base = Duration::from_millis(retry.backoff_base_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::label_warnings(
                    &self.http_client,
                    &self.endpoints,
                    &item.normalized,
                    rxnorm_id.as_deref(),
                    timeout,
                    retry.max_retries,
                    backoff_base,
                ))
                .await
                .map_err(PipelineError::from)?;
            let status = build_lookup_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "label_warnings", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: item.original.clone(), item_b: None, provider: "label_warnings".to_string(), status });
            }
            label_result = outcome.found().cloned();
        } else {
            cache_hits += 1;
        }

        let entry = ItemCacheEntry { rxnorm_id: rxnorm_id.clone(), supplement_id: supplement_id.clone(), label_warnings: label_result.clone(), updated_at: now };
        if let Err(err) = self.item_store.put(&item.normalized, &entry) {
            tracing::warn!(error = %err, item = %item.normalized, "item cache write failed, discarding");
        }

        let label_record = label_result.as_ref().and_then(|result| interax_evidence::standardize_label_warnings(result, now));

        let cached_exposure = self.exposure_store.get(&item.normalized, force_refresh).map_err(store_err_to_pipeline)?;
        let beneficiaries = if let Some(entry) = cached_exposure {
            cache_hits += 1;
            Some(entry.beneficiaries)
        } else if include_cms {
            cache_misses += 1;
            let timeout = Duration::from_millis(self.config.timeouts.exposure_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::cms_exposure(&self.http_client, &self.endpoints, &item.normalized, timeout))
                .await
                .map_err(PipelineError::from)?;
            let status = build_lookup_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "cms_exposure", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: item.original.clone(), item_b: None, provider: "cms_exposure".to_string(), status });
            }
            outcome.found().map(|result| {
                let entry = ExposureEntry { beneficiaries: result.beneficiaries, source: result.source.clone(), updated_at: now };
                if let Err(err) = self.exposure_store.put(&item.normalized, &entry) {
                    tracing::warn!(error = %err, item = %item.normalized, "exposure cache write failed, discarding");
                }
                entry.beneficiaries
            })
        } else {
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: item.original.clone(), item_b: None, provider: "cms_exposure".to_string(), status: skipped_status() });
            }
            None
        };

        Ok(ItemOutcome { normalized: item, rxnorm_id, supplement_id, label_record, beneficiaries, cache_hits, cache_misses, debug })
    }

    /// Computes one pair's merged, consensus-scored, confidence-scored
    /// report, reading the pair cache first and persisting a freshly
    /// computed report back to it.
    async fn fetch_pair(&self, a: &ItemOutcome, b: &ItemOutcome, force_refresh: bool, debug_enabled: bool, include_ai: bool) -> Result<PairOutcome, PipelineError> {
        let pair_key = interax_core::pair_key(&a.normalized.normalized, &b.normalized.normalized);
        let cached = self.pair_store.get(&pair_key, &self.config.calc_version, force_refresh).map_err(store_err_to_pipeline)?;
        if let Some(report) = cached {
            return Ok(PairOutcome { report, cache_hit: true, debug: Vec::new() });
        }

        let now = Timestamp::now();
        let mut raw = Vec::new();
        let mut debug = Vec::new();
        let mut primary_attempts: Vec<(Origin, bool)> = Vec::new();
        let mut rxnorm_interactions_failed = false;

        if let (Some(rxcui_a), Some(rxcui_b)) = (&a.rxnorm_id, &b.rxnorm_id) {
            let timeout = Duration::from_millis(self.config.timeouts.rxnorm_interactions_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::rxnorm_interactions(&self.http_client, &self.endpoints, rxcui_a, rxcui_b, timeout))
                .await
                .map_err(PipelineError::from)?;
            rxnorm_interactions_failed = outcome.is_err();
            primary_attempts.push((Origin::RxnormInteractions, !outcome.is_err()));
            let status = build_interaction_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "rxnorm_interactions", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            if let Some(result) = outcome.found() {
                raw.push(interax_evidence::standardize_rxnorm_interaction(result, now));
            }
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: a.normalized.original.clone(), item_b: Some(b.normalized.original.clone()), provider: "rxnorm_interactions".to_string(), status });
            }
        } else if debug_enabled {
            debug.push(ProviderDebugEntry {
                item_a: a.normalized.original.clone(),
                item_b: Some(b.normalized.original.clone()),
                provider: "rxnorm_interactions".to_string(),
                status: skipped_status(),
            });
        }

        if let (Some(id_a), Some(id_b)) = (&a.supplement_id, &b.supplement_id) {
            if self.credentials.has_supplement_key() {
                let timeout = Duration::from_millis(self.config.timeouts.supplement_ms);
                let start = Instant::now();
                let outcome = self
                    .upstream_limiter
                    .run(interax_providers::supplement_interactions(
                        &self.http_client,
                        &self.endpoints,
                        self.credentials.supplement_api_key.as_ref(),
                        id_a,
                        id_b,
                        timeout,
                    ))
                    .await
                    .map_err(PipelineError::from)?;
                primary_attempts.push((Origin::SupplementInteractions, !outcome.is_err()));
                let status = build_interaction_status(&outcome, elapsed_ms(start), false);
                tracing::debug!(provider = "supplement_interactions", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
                if let Some(findings) = outcome.found() {
                    if let Some(record) = interax_evidence::standardize_supplement_interactions(findings, now) {
                        raw.push(record);
                    }
                }
                if debug_enabled {
                    debug.push(ProviderDebugEntry {
                        item_a: a.normalized.original.clone(),
                        item_b: Some(b.normalized.original.clone()),
                        provider: "supplement_interactions".to_string(),
                        status,
                    });
                }
            } else if debug_enabled {
                debug.push(ProviderDebugEntry {
                    item_a: a.normalized.original.clone(),
                    item_b: Some(b.normalized.original.clone()),
                    provider: "supplement_interactions".to_string(),
                    status: skipped_status(),
                });
            }
        } else if debug_enabled {
            debug.push(ProviderDebugEntry {
                item_a: a.normalized.original.clone(),
                item_b: Some(b.normalized.original.clone()),
                provider: "supplement_interactions".to_string(),
                status: skipped_status(),
            });
        }

        {
            let timeout = Duration::from_millis(self.config.timeouts.adverse_events_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::pair_adverse_events(&self.http_client, &self.endpoints, &a.normalized.normalized, &b.normalized.normalized, timeout))
                .await
                .map_err(PipelineError::from)?;
            primary_attempts.push((Origin::PairAdverseEvents, !outcome.is_err()));
            let status = build_interaction_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "pair_adverse_events", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            let (beneficiaries, denominator) = match (a.beneficiaries, b.beneficiaries) {
                (Some(x), Some(y)) => (Some(x.min(y)), Some(DenominatorMethod::MinOfPair)),
                _ => (None, None),
            };
            if let Some(result) = outcome.found() {
                raw.push(interax_evidence::standardize_adverse_events(Origin::PairAdverseEvents, result, beneficiaries, denominator, now));
            }
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: a.normalized.original.clone(), item_b: Some(b.normalized.original.clone()), provider: "pair_adverse_events".to_string(), status });
            }
        }

        if self.credentials.has_literature_ai_key() && include_ai {
            let timeout = Duration::from_millis(self.config.timeouts.literature_ai_ms);
            let start = Instant::now();
            let outcome = self
                .upstream_limiter
                .run(interax_providers::literature_ai(
                    &self.http_client,
                    &self.endpoints,
                    self.credentials.literature_ai_api_key.as_ref(),
                    &a.normalized.normalized,
                    &b.normalized.normalized,
                    timeout,
                ))
                .await
                .map_err(PipelineError::from)?;
            let status = build_interaction_status(&outcome, elapsed_ms(start), false);
            tracing::debug!(provider = "literature_ai", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
            if let Some(finding) = outcome.found() {
                raw.push(interax_evidence::standardize_literature_ai(finding, now));
            }
            if debug_enabled {
                debug.push(ProviderDebugEntry { item_a: a.normalized.original.clone(), item_b: Some(b.normalized.original.clone()), provider: "literature_ai".to_string(), status });
            }
        } else if debug_enabled {
            debug.push(ProviderDebugEntry {
                item_a: a.normalized.original.clone(),
                item_b: Some(b.normalized.original.clone()),
                provider: "literature_ai".to_string(),
                status: skipped_status(),
            });
        }

        if let Some(record) = &a.label_record {
            raw.push(record.clone());
        }
        if let Some(record) = &b.label_record {
            raw.push(record.clone());
        }

        let merged = interax_evidence::merge(raw);
        let primary_success_count = interax_evidence::successful_primary_count(&primary_attempts);
        let any_primary_succeeded = primary_success_count > 0;
        let consensus_severity = interax_evidence::apply_none_rule(interax_evidence::consensus(&merged), merged.is_empty(), any_primary_succeeded);
        let confidence = interax_evidence::aggregate_confidence(&merged, primary_success_count, rxnorm_interactions_failed);
        let summary = crate::summary::build_summary(&merged, consensus_severity, any_primary_succeeded);
        let key_notes = crate::summary::build_key_notes(&merged);

        let report = PairReport {
            a_original: a.normalized.original.clone(),
            b_original: b.normalized.original.clone(),
            severity: consensus_severity,
            confidence,
            sources: merged,
            summary,
            key_notes,
        };

        if let Err(err) = self.pair_store.put(&pair_key, &self.config.calc_version, &report) {
            tracing::warn!(error = %err, pair = %pair_key.as_str(), "pair cache write failed, discarding");
        }

        Ok(PairOutcome { report, cache_hit: false, debug })
    }

    /// Computes one item's standalone report from its own label warning and
    /// a non-blocking single-drug adverse-event fetch.
    async fn fetch_single(&self, item: &ItemOutcome, debug_enabled: bool) -> Result<(SingleReport, Vec<ProviderDebugEntry>), PipelineError> {
        let now = Timestamp::now();
        let mut raw = Vec::new();
        let mut debug = Vec::new();

        let timeout = Duration::from_millis(self.config.timeouts.adverse_events_ms);
        let start = Instant::now();
        let outcome = self
            .upstream_limiter
            .run(interax_providers::single_adverse_events(&self.http_client, &self.endpoints, &item.normalized.normalized, timeout))
            .await
            .map_err(PipelineError::from)?;
        let succeeded = !outcome.is_err();
        let status = build_interaction_status(&outcome, elapsed_ms(start), false);
        tracing::debug!(provider = "single_adverse_events", ok = status.ok, elapsed_ms = status.elapsed_ms, error = status.error.as_deref(), "provider call complete");
        if let Some(result) = outcome.found() {
            let denominator = item.beneficiaries.map(|_| DenominatorMethod::SingleDrugA);
            raw.push(interax_evidence::standardize_adverse_events(Origin::SingleDrugAdverseEvents, result, item.beneficiaries, denominator, now));
        }
        if debug_enabled {
            debug.push(ProviderDebugEntry { item_a: item.normalized.original.clone(), item_b: None, provider: "single_adverse_events".to_string(), status });
        }
        if let Some(record) = &item.label_record {
            raw.push(record.clone());
        }

        let merged = interax_evidence::merge(raw);
        let primary_success_count = usize::from(succeeded);
        let consensus_severity = interax_evidence::apply_none_rule(interax_evidence::consensus(&merged), merged.is_empty(), succeeded);
        let confidence = interax_evidence::aggregate_confidence(&merged, primary_success_count, false);
        let summary = crate::summary::build_summary(&merged, consensus_severity, succeeded);

        let report = SingleReport {
            normalized: item.normalized.normalized.clone(),
            original: item.normalized.original.clone(),
            severity: consensus_severity,
            confidence,
            sources: merged,
            summary,
        };
        Ok((report, debug))
    }
}

/// Re-derives every triple's report from its three constituent pairs'
/// already-merged sources, without any new provider calls (§4.7).
fn run_triple_phase(
    items: &[NormalizedItem],
    triple_index: &[(usize, usize, usize)],
    pair_index: &[(usize, usize)],
    pair_reports: &[PairReport],
) -> Result<Vec<TripleReport>, PipelineError> {
    let pair_lookup: HashMap<(usize, usize), &PairReport> = pair_index.iter().copied().zip(pair_reports.iter()).collect();
    let mut triples = Vec::with_capacity(triple_index.len());
    for &(i, j, k) in triple_index {
        let pair_ij = lookup_pair(&pair_lookup, i, j)?;
        let pair_ik = lookup_pair(&pair_lookup, i, k)?;
        let pair_jk = lookup_pair(&pair_lookup, j, k)?;

        let union: Vec<EvidenceRecord> = pair_ij.sources.iter().chain(pair_ik.sources.iter()).chain(pair_jk.sources.iter()).cloned().collect();
        let merged = interax_evidence::merge(union);

        let primary_origin_count = merged.iter().map(|record| record.origin).filter(|origin| origin.is_primary()).collect::<BTreeSet<_>>().len();
        let any_pair_looked = [pair_ij, pair_ik, pair_jk].iter().any(|pair| pair.severity != Severity::Unknown);
        let primary_success_count = if primary_origin_count > 0 { primary_origin_count } else { usize::from(any_pair_looked) };
        let any_primary_succeeded = primary_success_count > 0;

        let consensus_severity = interax_evidence::apply_none_rule(interax_evidence::consensus(&merged), merged.is_empty(), any_primary_succeeded);
        let confidence = interax_evidence::aggregate_confidence(&merged, primary_success_count, false);
        let summary = crate::summary::build_summary(&merged, consensus_severity, any_primary_succeeded);
        let key_notes = crate::summary::build_key_notes(&merged);

        triples.push(TripleReport {
            a_original: items[i].original.clone(),
            b_original: items[j].original.clone(),
            c_original: items[k].original.clone(),
            severity: consensus_severity,
            confidence,
            sources: merged,
            summary,
            key_notes,
        });
    }
    Ok(triples)
}

/// Looks up a computed pair report by its ascending index pair.
fn lookup_pair<'a>(pair_lookup: &HashMap<(usize, usize), &'a PairReport>, i: usize, j: usize) -> Result<&'a PairReport, PipelineError> {
    let key = if i <= j { (i, j) } else { (j, i) };
    pair_lookup.get(&key).copied().ok_or_else(|| PipelineError::Internal("pair report missing for triple assembly".to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn interaction_status_treats_not_found_as_ok() {
        let outcome: ProviderOutcome<u32> = ProviderOutcome::NotFound;
        let status = build_interaction_status(&outcome, 5, false);
        assert!(status.ok);
        assert!(status.attempted);
    }

    #[test]
    fn lookup_status_treats_not_found_as_failure() {
        let outcome: ProviderOutcome<u32> = ProviderOutcome::NotFound;
        let status = build_lookup_status(&outcome, 5, false);
        assert!(!status.ok);
        assert!(status.attempted);
    }

    #[test]
    fn both_status_builders_surface_the_error_message() {
        let outcome: ProviderOutcome<u32> = ProviderOutcome::Err(ProviderError::MissingCredential);
        assert!(build_interaction_status(&outcome, 1, false).error.is_some());
        assert!(build_lookup_status(&outcome, 1, false).error.is_some());
    }

    fn item(name: &str) -> NormalizedItem {
        NormalizedItem { normalized: name.to_string(), original: name.to_string() }
    }

    fn evidence(origin: Origin, severity: Severity) -> EvidenceRecord {
        EvidenceRecord {
            origin,
            severity,
            confidence: origin.base_confidence(),
            summary: "finding".to_string(),
            details: Default::default(),
            citations: Default::default(),
            stats: None,
            observed_at: Timestamp::now(),
        }
    }

    fn pair_report(a: &str, b: &str, sources: Vec<EvidenceRecord>, severity: Severity) -> PairReport {
        PairReport {
            a_original: a.to_string(),
            b_original: b.to_string(),
            severity,
            confidence: 0.5,
            sources,
            summary: String::new(),
            key_notes: Vec::new(),
        }
    }

    #[test]
    fn triple_phase_reunites_each_pairs_sources_without_new_calls() {
        let items = [item("warfarin"), item("aspirin"), item("ibuprofen")];
        let pair_index = [(0, 1), (0, 2), (1, 2)];
        let pairs = vec![
            pair_report("warfarin", "aspirin", vec![evidence(Origin::RxnormInteractions, Severity::Severe)], Severity::Severe),
            pair_report("warfarin", "ibuprofen", vec![evidence(Origin::PairAdverseEvents, Severity::Mild)], Severity::Mild),
            pair_report("aspirin", "ibuprofen", vec![evidence(Origin::SupplementInteractions, Severity::Mild)], Severity::Mild),
        ];
        let triple_index = [(0, 1, 2)];
        let triples = run_triple_phase(&items, &triple_index, &pair_index, &pairs).unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].severity, Severity::Severe);
        assert_eq!(triples[0].sources.len(), 3);
    }

    #[test]
    fn triple_phase_demotes_a_lone_severe_without_a_high_reliability_vote() {
        let items = [item("a"), item("b"), item("c")];
        let pair_index = [(0, 1), (0, 2), (1, 2)];
        let pairs = vec![
            pair_report("a", "b", vec![evidence(Origin::LiteratureAi, Severity::Severe)], Severity::Moderate),
            pair_report("a", "c", vec![evidence(Origin::LiteratureAi, Severity::Mild)], Severity::Mild),
            pair_report("b", "c", Vec::new(), Severity::Unknown),
        ];
        let triple_index = [(0, 1, 2)];
        let triples = run_triple_phase(&items, &triple_index, &pair_index, &pairs).unwrap();
        assert_eq!(triples[0].severity, Severity::Moderate);
    }

    #[test]
    fn triple_phase_fails_closed_when_a_constituent_pair_is_missing() {
        let items = [item("a"), item("b"), item("c")];
        let pair_index = [(0, 1)];
        let pairs = vec![pair_report("a", "b", Vec::new(), Severity::Unknown)];
        let triple_index = [(0, 1, 2)];
        assert!(run_triple_phase(&items, &triple_index, &pair_index, &pairs).is_err());
    }

    #[test]
    fn lookup_pair_is_symmetric_in_its_index_order() {
        let pair_index = [(0, 1)];
        let pairs = vec![pair_report("a", "b", Vec::new(), Severity::None)];
        let lookup: HashMap<(usize, usize), &PairReport> = pair_index.iter().copied().zip(pairs.iter()).collect();
        assert!(lookup_pair(&lookup, 1, 0).unwrap().a_original == "a");
    }
}
