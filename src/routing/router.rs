/*!
 * Quality-aware provider routing (QAPR).
 *
 * Scores every configured provider for a language pair and document type,
 * blending historical stats with cold-start priors, and picks the best one
 * under the requested mode:
 * - BEST_QUALITY: quality first, cost ignored
 * - CHEAPEST_GOOD_ENOUGH: cheapest provider clearing a quality bar
 * - BALANCED: fixed blend of quality, cost, latency and success
 *
 * Routing only reads a snapshot of the stats tracker; it never fails. With
 * every provider excluded it degrades to the first configured provider.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

use super::priors::{ProviderPrior, default_priors};
use super::stats::{CallRecord, ProviderMetrics, StatsTracker};
use crate::app_config::RoutingConfig;
use crate::errors::ConfigError;
use crate::language_utils::{WILDCARD, normalize_language_pair};
use crate::quality::report::round_to;

/// Provider selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    BestQuality,
    CheapestGoodEnough,
    #[default]
    Balanced,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestQuality => "best_quality",
            Self::CheapestGoodEnough => "cheapest_good_enough",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoutingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "best_quality" | "quality" => Ok(Self::BestQuality),
            "cheapest_good_enough" | "cheapest" => Ok(Self::CheapestGoodEnough),
            "balanced" => Ok(Self::Balanced),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Where a candidate's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Enough real calls to use them directly
    Historical,
    /// Priors blended with a few real calls
    Blended,
    /// Priors only
    ColdStart,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Blended => "blended",
            Self::ColdStart => "cold_start",
        }
    }
}

/// Sub-scores of one provider for one routing call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub provider: String,
    /// Effective quality (0.0 - 1.0)
    pub quality: f64,
    pub cost_per_1k_tokens: f64,
    pub latency_ms: f64,
    pub success_rate: f64,
    /// Normalized cost; cheaper is higher, free is 1.0
    pub cost_score: f64,
    /// Normalized latency; faster is higher, instant is 1.0
    pub latency_score: f64,
    /// Mode-specific combination
    pub composite: f64,
    /// Real calls behind the numbers
    pub calls: u64,
    pub source: ScoreSource,
}

impl CandidateScore {
    /// Flat display representation.
    pub fn to_json(&self) -> Value {
        json!({
            "provider": self.provider,
            "quality": round_to(self.quality, 4),
            "cost_per_1k_tokens": round_to(self.cost_per_1k_tokens, 6),
            "latency_ms": round_to(self.latency_ms, 1),
            "success_rate": round_to(self.success_rate, 4),
            "cost_score": round_to(self.cost_score, 4),
            "latency_score": round_to(self.latency_score, 4),
            "composite": round_to(self.composite, 4),
            "calls": self.calls,
            "source": self.source.as_str(),
        })
    }
}

/// Chosen provider with every scored candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub provider: String,
    pub mode: RoutingMode,
    /// Composite score of the chosen provider; 0.0 on the fallback path
    pub score: f64,
    pub reason: String,
    /// Candidates in configuration order
    pub candidates: Vec<CandidateScore>,
}

impl RoutingDecision {
    /// Whether the decision came from the no-candidate fallback
    pub fn is_fallback(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Flat display representation.
    pub fn to_json(&self) -> Value {
        json!({
            "provider": self.provider,
            "mode": self.mode.as_str(),
            "score": round_to(self.score, 4),
            "reason": self.reason,
            "candidates": self.candidates.iter().map(CandidateScore::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Normalize a cost per 1k tokens into 0-1; free scores 1.0.
pub fn cost_score(cost_per_1k_tokens: f64) -> f64 {
    1.0 / (1.0 + 100.0 * cost_per_1k_tokens.max(0.0))
}

/// Normalize a latency into 0-1; instant scores 1.0.
pub fn latency_score(latency_ms: f64) -> f64 {
    1.0 / (1.0 + latency_ms.max(0.0) / 5000.0)
}

/// Penalty factor for candidates under the quality bar
const BELOW_THRESHOLD_FACTOR: f64 = 0.1;

/// Selects the LLM provider for a translation call.
#[derive(Debug, Clone)]
pub struct ProviderRouter {
    tracker: StatsTracker,
    priors: Vec<ProviderPrior>,
    default_mode: RoutingMode,
    quality_threshold: f64,
    min_calls_for_history: u64,
}

impl ProviderRouter {
    /// Create a router over a shared tracker.
    pub fn new(tracker: StatsTracker, config: &RoutingConfig) -> Self {
        Self {
            tracker,
            priors: config.providers.clone(),
            default_mode: config.default_mode,
            quality_threshold: config.quality_threshold,
            min_calls_for_history: config.min_calls_for_history.max(1),
        }
    }

    /// Create a router with the built-in priors and default settings.
    pub fn with_defaults(tracker: StatsTracker) -> Self {
        Self::new(tracker, &RoutingConfig::default())
    }

    /// Set the mode used when none is requested.
    pub fn with_mode(mut self, mode: RoutingMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Replace the provider priors.
    pub fn with_priors(mut self, priors: Vec<ProviderPrior>) -> Self {
        self.priors = priors;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn tracker(&self) -> &StatsTracker {
        &self.tracker
    }

    pub fn priors(&self) -> &[ProviderPrior] {
        &self.priors
    }

    pub fn default_mode(&self) -> RoutingMode {
        self.default_mode
    }

    pub fn quality_threshold(&self) -> f64 {
        self.quality_threshold
    }

    /// Pick the best provider for a language pair and document type.
    pub fn select(
        &self,
        language_pair: &str,
        document_type: &str,
        mode: Option<RoutingMode>,
        exclude_providers: &[&str],
    ) -> RoutingDecision {
        let mode = mode.unwrap_or(self.default_mode);
        let pair = normalize_language_pair(language_pair);
        let candidates = self.score_candidates(&pair, document_type, mode, exclude_providers);

        let mut best: Option<&CandidateScore> = None;
        for candidate in &candidates {
            if best.is_none_or(|current| candidate.composite > current.composite) {
                best = Some(candidate);
            }
        }

        let Some(best) = best else {
            let provider = self
                .priors
                .first()
                .map(|p| p.name.clone())
                .unwrap_or_default();
            warn!(
                "No routing candidates for {} / {} after exclusions; falling back to '{}'",
                pair, document_type, provider
            );
            return RoutingDecision {
                provider: provider.clone(),
                mode,
                score: 0.0,
                reason: format!(
                    "No candidates available (all excluded); falling back to first configured provider '{}'",
                    provider
                ),
                candidates,
            };
        };

        let reason = self.explain(best, mode, candidates.len());
        info!(
            "Routed {} / {} to {} ({}, score {:.3})",
            pair, document_type, best.provider, mode, best.composite
        );

        RoutingDecision {
            provider: best.provider.clone(),
            mode,
            score: best.composite,
            reason,
            candidates: candidates.clone(),
        }
    }

    /// Every non-excluded candidate, best first (configuration order on ties).
    pub fn rank(
        &self,
        language_pair: &str,
        document_type: &str,
        mode: Option<RoutingMode>,
        exclude_providers: &[&str],
    ) -> Vec<CandidateScore> {
        let mode = mode.unwrap_or(self.default_mode);
        let pair = normalize_language_pair(language_pair);
        let mut candidates = self.score_candidates(&pair, document_type, mode, exclude_providers);
        candidates.sort_by(|a, b| b.composite.total_cmp(&a.composite));
        candidates
    }

    /// Report a finished call into the shared tracker.
    pub fn record_outcome(&self, record: CallRecord) {
        self.tracker.record(record);
    }

    fn score_candidates(
        &self,
        pair: &str,
        document_type: &str,
        mode: RoutingMode,
        exclude_providers: &[&str],
    ) -> Vec<CandidateScore> {
        self.priors
            .iter()
            .filter(|prior| !exclude_providers.contains(&prior.name.as_str()))
            .map(|prior| self.score_provider(prior, pair, document_type, mode))
            .collect()
    }

    /// Most specific metrics with at least one call.
    ///
    /// Tries `(pair, type)`, `(pair, *)`, `(*, type)`, then the provider-wide
    /// aggregate.
    fn resolve_metrics(&self, provider: &str, pair: &str, document_type: &str) -> Option<ProviderMetrics> {
        let lookups = [
            (pair, document_type),
            (pair, WILDCARD),
            (WILDCARD, document_type),
        ];

        lookups
            .iter()
            .filter_map(|(p, d)| self.tracker.get_metrics(provider, p, d))
            .find(|m| m.total_calls() > 0)
            .or_else(|| {
                Some(self.tracker.get_provider_summary(provider)).filter(|m| m.total_calls() > 0)
            })
    }

    fn score_provider(
        &self,
        prior: &ProviderPrior,
        pair: &str,
        document_type: &str,
        mode: RoutingMode,
    ) -> CandidateScore {
        let metrics = self.resolve_metrics(&prior.name, pair, document_type);
        let calls = metrics.as_ref().map_or(0, ProviderMetrics::total_calls);

        let (quality, cost, latency, success, source) = match metrics {
            Some(m) if calls >= self.min_calls_for_history => (
                m.avg_quality(),
                m.cost_per_1k_tokens(),
                m.avg_latency_ms(),
                m.success_rate(),
                ScoreSource::Historical,
            ),
            Some(m) => {
                let prior_quality = prior.effective_quality(pair, document_type);
                let blend = calls as f64 / self.min_calls_for_history as f64;
                let mix = |prior_value: f64, real: f64| prior_value * (1.0 - blend) + real * blend;
                (
                    mix(prior_quality, m.avg_quality()),
                    mix(prior.cost_per_1k_tokens, m.cost_per_1k_tokens()),
                    mix(prior.latency_ms, m.avg_latency_ms()),
                    mix(prior.success_rate, m.success_rate()),
                    ScoreSource::Blended,
                )
            }
            None => (
                prior.effective_quality(pair, document_type),
                prior.cost_per_1k_tokens,
                prior.latency_ms,
                prior.success_rate,
                ScoreSource::ColdStart,
            ),
        };

        let cost_score = cost_score(cost);
        let latency_score = latency_score(latency);

        let composite = match mode {
            RoutingMode::BestQuality => 0.7 * quality + 0.2 * success + 0.1 * latency_score,
            RoutingMode::CheapestGoodEnough => {
                if quality < self.quality_threshold {
                    BELOW_THRESHOLD_FACTOR * quality
                } else {
                    0.6 * cost_score + 0.2 * quality + 0.2 * success
                }
            }
            RoutingMode::Balanced => {
                0.4 * quality + 0.25 * cost_score + 0.15 * latency_score + 0.2 * success
            }
        };

        debug!(
            "Candidate {} ({}): q={:.3} cost={:.4} lat={:.0} succ={:.2} -> {:.3}",
            prior.name,
            source.as_str(),
            quality,
            cost,
            latency,
            success,
            composite
        );

        CandidateScore {
            provider: prior.name.clone(),
            quality,
            cost_per_1k_tokens: cost,
            latency_ms: latency,
            success_rate: success,
            cost_score,
            latency_score,
            composite,
            calls,
            source,
        }
    }

    fn explain(&self, best: &CandidateScore, mode: RoutingMode, candidate_count: usize) -> String {
        let basis = match best.source {
            ScoreSource::Historical => format!("{} historical calls", best.calls),
            ScoreSource::Blended => format!("priors blended with {} calls", best.calls),
            ScoreSource::ColdStart => "cold-start priors".to_string(),
        };

        match mode {
            RoutingMode::BestQuality => format!(
                "Highest quality ({:.2}) of {} candidates, from {}",
                best.quality, candidate_count, basis
            ),
            RoutingMode::CheapestGoodEnough if best.quality < self.quality_threshold => format!(
                "No candidate meets quality {:.2}; best available ({:.2}) of {}, from {}",
                self.quality_threshold, best.quality, candidate_count, basis
            ),
            RoutingMode::CheapestGoodEnough => format!(
                "Cheapest (${:.4}/1k tokens) with quality {:.2} >= {:.2} of {} candidates, from {}",
                best.cost_per_1k_tokens, best.quality, self.quality_threshold, candidate_count, basis
            ),
            RoutingMode::Balanced => format!(
                "Best balance of quality {:.2}, cost ${:.4}/1k, latency {:.0}ms of {} candidates, from {}",
                best.quality, best.cost_per_1k_tokens, best.latency_ms, candidate_count, basis
            ),
        }
    }
}
