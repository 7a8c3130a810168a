/*!
 * Provider call statistics.
 *
 * This module aggregates the outcome of every provider call, keyed by
 * `(provider, language_pair, document_type)`, to feed routing decisions.
 *
 * The tracker is a cheap `Clone` handle over shared state. All mutation goes
 * through a single coarse lock; when a persistence path is configured the
 * whole map is written to a JSON file after the lock is released. Concurrent
 * writers may therefore race on the file (last writer wins on disk) while the
 * in-memory aggregates stay exact. Persistence failures are logged and never
 * propagated.
 */

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::StatsError;
use crate::language_utils::{WILDCARD, normalize_language_pair, wildcard_matches};
use crate::quality::report::round_to;

/// Key of an aggregate: provider, language pair and document type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricsKey {
    pub provider: String,
    pub language_pair: String,
    pub document_type: String,
}

impl MetricsKey {
    /// Create a key; the language pair is normalized to `src→tgt`.
    pub fn new(provider: &str, language_pair: &str, document_type: &str) -> Self {
        Self {
            provider: provider.trim().to_string(),
            language_pair: normalize_language_pair(language_pair),
            document_type: normalize_document_type(document_type),
        }
    }
}

fn normalize_document_type(document_type: &str) -> String {
    let trimmed = document_type.trim();
    if trimmed.is_empty() {
        WILDCARD.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// A single reported provider call. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub provider: String,
    pub language_pair: String,
    pub document_type: String,
    pub success: bool,
    #[serde(default)]
    pub latency_ms: f64,
    /// Quality of the produced translation (0.0 - 1.0)
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub cost_usd: f64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CallRecord {
    /// Create a record stamped with the current time and zeroed measurements.
    pub fn new(provider: &str, language_pair: &str, document_type: &str, success: bool) -> Self {
        Self {
            provider: provider.to_string(),
            language_pair: language_pair.to_string(),
            document_type: document_type.to_string(),
            success,
            latency_ms: 0.0,
            quality_score: 0.0,
            cost_usd: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_quality(mut self, quality_score: f64) -> Self {
        self.quality_score = quality_score;
        self
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }

    pub fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn key(&self) -> MetricsKey {
        MetricsKey::new(&self.provider, &self.language_pair, &self.document_type)
    }
}

/// Aggregated outcomes for one key.
///
/// Only successful calls add to the latency, quality, cost and token sums;
/// failures only increment `failure_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetrics {
    pub provider: String,
    pub language_pair: String,
    pub document_type: String,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub total_latency_ms: f64,
    #[serde(default)]
    pub total_quality_score: f64,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProviderMetrics {
    /// Empty aggregate for a key.
    pub fn new(key: &MetricsKey) -> Self {
        Self {
            provider: key.provider.clone(),
            language_pair: key.language_pair.clone(),
            document_type: key.document_type.clone(),
            success_count: 0,
            failure_count: 0,
            total_latency_ms: 0.0,
            total_quality_score: 0.0,
            total_cost_usd: 0.0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            last_updated: None,
        }
    }

    pub fn key(&self) -> MetricsKey {
        MetricsKey {
            provider: self.provider.clone(),
            language_pair: self.language_pair.clone(),
            document_type: self.document_type.clone(),
        }
    }

    pub fn total_calls(&self) -> u64 {
        self.success_count + self.failure_count
    }

    pub fn success_rate(&self) -> f64 {
        ratio(self.success_count as f64, self.total_calls() as f64)
    }

    /// Mean latency of successful calls.
    pub fn avg_latency_ms(&self) -> f64 {
        ratio(self.total_latency_ms, self.success_count as f64)
    }

    /// Mean quality of successful calls.
    pub fn avg_quality(&self) -> f64 {
        ratio(self.total_quality_score, self.success_count as f64)
    }

    /// Cost per thousand tokens (input and output) of successful calls.
    pub fn cost_per_1k_tokens(&self) -> f64 {
        let tokens = (self.total_input_tokens + self.total_output_tokens) as f64;
        ratio(self.total_cost_usd, tokens / 1000.0)
    }

    /// Fold a call outcome into the aggregate.
    pub fn apply(&mut self, record: &CallRecord) {
        if record.success {
            self.success_count += 1;
            self.total_latency_ms += record.latency_ms;
            self.total_quality_score += record.quality_score;
            self.total_cost_usd += record.cost_usd;
            self.total_input_tokens += record.input_tokens;
            self.total_output_tokens += record.output_tokens;
        } else {
            self.failure_count += 1;
        }

        self.last_updated = Some(match self.last_updated {
            Some(previous) if previous > record.timestamp => previous,
            _ => record.timestamp,
        });
    }

    /// Add another aggregate's sums to this one.
    pub fn merge(&mut self, other: &ProviderMetrics) {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.total_latency_ms += other.total_latency_ms;
        self.total_quality_score += other.total_quality_score;
        self.total_cost_usd += other.total_cost_usd;
        self.total_input_tokens += other.total_input_tokens;
        self.total_output_tokens += other.total_output_tokens;
        self.last_updated = match (self.last_updated, other.last_updated) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Flat display representation with derived fields.
    pub fn to_json(&self) -> Value {
        json!({
            "provider": self.provider,
            "language_pair": self.language_pair,
            "document_type": self.document_type,
            "success_count": self.success_count,
            "failure_count": self.failure_count,
            "total_calls": self.total_calls(),
            "success_rate": round_to(self.success_rate(), 4),
            "avg_latency_ms": round_to(self.avg_latency_ms(), 1),
            "avg_quality": round_to(self.avg_quality(), 4),
            "cost_per_1k_tokens": round_to(self.cost_per_1k_tokens(), 6),
            "total_cost_usd": round_to(self.total_cost_usd, 6),
            "total_input_tokens": self.total_input_tokens,
            "total_output_tokens": self.total_output_tokens,
            "last_updated": self.last_updated.map(|t| t.to_rfc3339()),
        })
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

struct TrackerState {
    metrics: Mutex<HashMap<MetricsKey, ProviderMetrics>>,
    persist_path: Option<PathBuf>,
}

/// Thread-safe store of provider call aggregates.
#[derive(Clone)]
pub struct StatsTracker {
    state: Arc<TrackerState>,
}

impl StatsTracker {
    /// Create a tracker that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(TrackerState {
                metrics: Mutex::new(HashMap::new()),
                persist_path: None,
            }),
        }
    }

    /// Create a tracker persisted at `path`, loading whatever is there.
    ///
    /// A missing or corrupt file leaves the tracker empty.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tracker = Self {
            state: Arc::new(TrackerState {
                metrics: Mutex::new(HashMap::new()),
                persist_path: Some(path.clone()),
            }),
        };

        if path.exists() {
            match tracker.load(&path) {
                Ok(count) => info!("Loaded {} provider metrics from {}", count, path.display()),
                Err(e) => warn!("Starting with empty provider stats: {}", e),
            }
        } else {
            debug!("No provider stats at {}, starting empty", path.display());
        }

        tracker
    }

    /// Where the tracker persists, if anywhere.
    pub fn persist_path(&self) -> Option<&Path> {
        self.state.persist_path.as_deref()
    }

    /// Record a call outcome.
    pub fn record(&self, record: CallRecord) {
        let key = record.key();
        let snapshot = {
            let mut metrics = self.state.metrics.lock();
            metrics
                .entry(key.clone())
                .or_insert_with(|| ProviderMetrics::new(&key))
                .apply(&record);

            self.state
                .persist_path
                .as_ref()
                .map(|_| metrics.values().cloned().collect::<Vec<_>>())
        };

        debug!(
            "Recorded {} call for {} ({} / {})",
            if record.success { "successful" } else { "failed" },
            key.provider,
            key.language_pair,
            key.document_type
        );

        if let Some(snapshot) = snapshot {
            self.persist_snapshot(&sorted(snapshot));
        }
    }

    /// Record several call outcomes.
    pub fn record_many<I>(&self, records: I)
    where
        I: IntoIterator<Item = CallRecord>,
    {
        for record in records {
            self.record(record);
        }
    }

    /// Metrics for an exact key.
    pub fn get_metrics(
        &self,
        provider: &str,
        language_pair: &str,
        document_type: &str,
    ) -> Option<ProviderMetrics> {
        let key = MetricsKey::new(provider, language_pair, document_type);
        self.state.metrics.lock().get(&key).cloned()
    }

    /// Aggregate of every key of a provider, keyed `(provider, *, *)`.
    pub fn get_provider_summary(&self, provider: &str) -> ProviderMetrics {
        let key = MetricsKey::new(provider, WILDCARD, WILDCARD);
        let mut summary = ProviderMetrics::new(&key);

        let metrics = self.state.metrics.lock();
        for entry in metrics.values().filter(|m| m.provider == key.provider) {
            summary.merge(entry);
        }

        summary
    }

    /// Every aggregate, ordered by key.
    pub fn get_all_metrics(&self) -> Vec<ProviderMetrics> {
        let snapshot: Vec<ProviderMetrics> = self.state.metrics.lock().values().cloned().collect();
        sorted(snapshot)
    }

    /// Providers with data matching a pair and type; `*` matches anything.
    pub fn get_providers_for(&self, language_pair: &str, document_type: &str) -> Vec<String> {
        let pair = normalize_language_pair(language_pair);
        let doc_type = normalize_document_type(document_type);

        let mut providers: Vec<String> = self
            .state
            .metrics
            .lock()
            .values()
            .filter(|m| m.total_calls() > 0)
            .filter(|m| wildcard_matches(&m.language_pair, &pair))
            .filter(|m| wildcard_matches(&m.document_type, &doc_type))
            .map(|m| m.provider.clone())
            .collect();

        providers.sort();
        providers.dedup();
        providers
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.state.metrics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.metrics.lock().is_empty()
    }

    /// Drop every aggregate, including the persisted copy.
    pub fn clear(&self) {
        self.state.metrics.lock().clear();
        info!("Provider stats cleared");

        if self.state.persist_path.is_some() {
            self.persist_snapshot(&[]);
        }
    }

    /// Write the current map to the persistence path.
    ///
    /// Does nothing for in-memory trackers.
    pub fn save(&self) -> Result<(), StatsError> {
        match &self.state.persist_path {
            Some(path) => {
                let snapshot = self.get_all_metrics();
                write_snapshot(path, &snapshot)
            }
            None => Ok(()),
        }
    }

    /// Merge the aggregates stored in `path` into memory.
    ///
    /// Returns the number of records read.
    pub fn load(&self, path: &Path) -> Result<usize, StatsError> {
        let content = fs::read_to_string(path).map_err(|source| StatsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<ProviderMetrics> =
            serde_json::from_str(&content).map_err(|source| StatsError::Serialization {
                path: path.display().to_string(),
                source,
            })?;

        let mut metrics = self.state.metrics.lock();
        for record in &records {
            // Hand-edited files may carry `ZH->EN` or `Legal`
            let key = MetricsKey::new(&record.provider, &record.language_pair, &record.document_type);
            metrics
                .entry(key.clone())
                .or_insert_with(|| ProviderMetrics::new(&key))
                .merge(record);
        }

        Ok(records.len())
    }

    fn persist_snapshot(&self, snapshot: &[ProviderMetrics]) {
        if let Some(path) = &self.state.persist_path {
            if let Err(e) = write_snapshot(path, snapshot) {
                warn!("Failed to persist provider stats: {}", e);
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for StatsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsTracker")
            .field("keys", &self.len())
            .field("persist_path", &self.state.persist_path)
            .finish()
    }
}

fn sorted(mut snapshot: Vec<ProviderMetrics>) -> Vec<ProviderMetrics> {
    snapshot.sort_by(|a, b| a.key().cmp(&b.key()));
    snapshot
}

fn write_snapshot(path: &Path, snapshot: &[ProviderMetrics]) -> Result<(), StatsError> {
    let io_error = |source| StatsError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let json = serde_json::to_string_pretty(snapshot).map_err(|source| StatsError::Serialization {
        path: path.display().to_string(),
        source,
    })?;

    fs::write(path, json).map_err(io_error)
}
