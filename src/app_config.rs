use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::feedback::FallbackChain;
use crate::language_utils::{PAIR_SEPARATOR, normalize_language_pair, validate_language_code};
use crate::quality::{DensityThresholds, SignalWeights};
use crate::routing::{ProviderPrior, RoutingMode, default_priors};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Extraction quality scoring
    #[serde(default)]
    pub quality: QualityConfig,

    /// Retry/escalation loop
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Provider routing
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Provider stats persistence
    #[serde(default)]
    pub stats: StatsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Quality scorer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QualityConfig {
    /// Per-signal weights; must sum to 1.0
    #[serde(default)]
    pub weights: SignalWeights,

    /// Characters-per-page bands for the density signal
    #[serde(default)]
    pub density: DensityThresholds,

    /// Characters per page below which a document looks truncated
    #[serde(default = "default_expected_chars_per_page")]
    pub expected_chars_per_page: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            density: DensityThresholds::default(),
            expected_chars_per_page: default_expected_chars_per_page(),
        }
    }
}

/// Feedback loop configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeedbackConfig {
    /// Minimum overall score to accept an extraction
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Maximum extraction attempts per document
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Strategies tried in order on low quality
    #[serde(default)]
    pub fallback_chain: FallbackChain,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_retries: default_max_retries(),
            fallback_chain: FallbackChain::default(),
        }
    }
}

/// Provider routing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Mode used when the caller does not pick one
    #[serde(default)]
    pub default_mode: RoutingMode,

    /// Quality bar for the cheapest-good-enough mode
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Calls after which history replaces the priors entirely
    #[serde(default = "default_min_calls_for_history")]
    pub min_calls_for_history: u64,

    /// Candidate providers, in fallback order
    #[serde(default = "default_priors")]
    pub providers: Vec<ProviderPrior>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_mode: RoutingMode::default(),
            quality_threshold: default_quality_threshold(),
            min_calls_for_history: default_min_calls_for_history(),
            providers: default_priors(),
        }
    }
}

/// Stats persistence configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StatsConfig {
    /// JSON file holding provider metrics; in-memory only when unset
    #[serde(default)]
    pub persist_path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_expected_chars_per_page() -> f64 {
    50.0
}

fn default_min_score() -> f64 {
    0.6
}

fn default_max_retries() -> usize {
    3
}

fn default_quality_threshold() -> f64 {
    0.75
}

fn default_min_calls_for_history() -> u64 {
    3
}

/// Default location of the stats file under the user's data directory
pub fn default_stats_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("docqa").join("provider_stats.json"))
}

fn check_unit_range(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            message: format!("must be between 0.0 and 1.0, got {}", value),
        });
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            message: format!("must be a non-negative number, got {}", value),
        });
    }
    Ok(())
}

impl Config {
    /// Load a configuration from a JSON file; missing sections take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality.validate()?;
        self.feedback.validate()?;
        self.routing.validate()?;
        Ok(())
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        let d = &self.density;
        check_non_negative("quality.density.min_chars_per_page", d.min_chars_per_page)?;
        if !(d.min_chars_per_page < d.ideal_chars_per_page
            && d.ideal_chars_per_page <= d.max_chars_per_page)
        {
            return Err(ConfigError::OutOfRange {
                field: "quality.density".to_string(),
                message: format!(
                    "thresholds must satisfy min < ideal <= max, got {} / {} / {}",
                    d.min_chars_per_page, d.ideal_chars_per_page, d.max_chars_per_page
                ),
            });
        }

        if !(self.expected_chars_per_page.is_finite() && self.expected_chars_per_page > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "quality.expected_chars_per_page".to_string(),
                message: format!("must be positive, got {}", self.expected_chars_per_page),
            });
        }

        Ok(())
    }
}

impl FeedbackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_score > 0.0 && self.min_score <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "feedback.min_score".to_string(),
                message: format!("must be in (0.0, 1.0], got {}", self.min_score),
            });
        }

        if self.max_retries == 0 {
            return Err(ConfigError::OutOfRange {
                field: "feedback.max_retries".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.fallback_chain.is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "feedback.fallback_chain".to_string(),
                message: "must contain at least one strategy".to_string(),
            });
        }

        Ok(())
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_range("routing.quality_threshold", self.quality_threshold)?;

        if self.min_calls_for_history == 0 {
            return Err(ConfigError::OutOfRange {
                field: "routing.min_calls_for_history".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.providers.is_empty() {
            return Err(ConfigError::Providers(
                "at least one provider must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for prior in &self.providers {
            if prior.name.trim().is_empty() {
                return Err(ConfigError::Providers("provider name cannot be empty".to_string()));
            }
            if !seen.insert(prior.name.as_str()) {
                return Err(ConfigError::Providers(format!(
                    "provider '{}' is configured more than once",
                    prior.name
                )));
            }

            let field = |name: &str| format!("routing.providers.{}.{}", prior.name, name);
            check_unit_range(&field("quality"), prior.quality)?;
            check_unit_range(&field("success_rate"), prior.success_rate)?;
            check_non_negative(&field("cost_per_1k_tokens"), prior.cost_per_1k_tokens)?;
            check_non_negative(&field("latency_ms"), prior.latency_ms)?;

            for pair in &prior.language_affinities {
                validate_pair(pair)?;
            }
        }

        Ok(())
    }
}

fn validate_pair(pair: &str) -> Result<(), ConfigError> {
    let normalized = normalize_language_pair(pair);
    let Some((source, target)) = normalized.split_once(PAIR_SEPARATOR) else {
        return Err(ConfigError::Language(format!(
            "'{}' is not a 'src→tgt' language pair",
            pair
        )));
    };

    for code in [source, target] {
        validate_language_code(code)
            .map_err(|e| ConfigError::Language(format!("{} in pair '{}'", e, pair)))?;
    }

    Ok(())
}
