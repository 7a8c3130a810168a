/*!
 * Extraction quality scorer.
 *
 * Combines the six signals into a single Extraction Quality Score (EQS).
 * The scorer holds only immutable configuration, so a single instance can be
 * shared and called concurrently without synchronization.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::report::{QualityReport, ReportMetadata, SignalName};
use super::signals::{self, DensityThresholds};
use crate::app_config::QualityConfig;
use crate::errors::QualityError;

/// Accepted distance of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Weights of the six signals; they must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    #[serde(default = "default_text_density_weight")]
    pub text_density: f64,
    #[serde(default = "default_structure_weight")]
    pub structure: f64,
    #[serde(default = "default_encoding_weight")]
    pub encoding: f64,
    #[serde(default = "default_language_weight")]
    pub language: f64,
    #[serde(default = "default_completeness_weight")]
    pub completeness: f64,
    #[serde(default = "default_format_integrity_weight")]
    pub format_integrity: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            text_density: default_text_density_weight(),
            structure: default_structure_weight(),
            encoding: default_encoding_weight(),
            language: default_language_weight(),
            completeness: default_completeness_weight(),
            format_integrity: default_format_integrity_weight(),
        }
    }
}

fn default_text_density_weight() -> f64 {
    0.20
}

fn default_structure_weight() -> f64 {
    0.15
}

fn default_encoding_weight() -> f64 {
    0.20
}

fn default_language_weight() -> f64 {
    0.20
}

fn default_completeness_weight() -> f64 {
    0.15
}

fn default_format_integrity_weight() -> f64 {
    0.10
}

impl SignalWeights {
    /// Weight assigned to a signal.
    pub fn get(&self, name: SignalName) -> f64 {
        match name {
            SignalName::TextDensity => self.text_density,
            SignalName::Structure => self.structure,
            SignalName::Encoding => self.encoding,
            SignalName::Language => self.language,
            SignalName::Completeness => self.completeness,
            SignalName::FormatIntegrity => self.format_integrity,
        }
    }

    /// Sum of all six weights.
    pub fn sum(&self) -> f64 {
        SignalName::ALL.iter().map(|name| self.get(*name)).sum()
    }

    /// Check every weight is usable and the sum is 1.0 ± tolerance.
    pub fn validate(&self) -> Result<(), QualityError> {
        for name in SignalName::ALL {
            let value = self.get(name);
            if !value.is_finite() || value < 0.0 {
                return Err(QualityError::InvalidWeight {
                    signal: name.as_str().to_string(),
                    value,
                });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(QualityError::InvalidWeights {
                sum,
                tolerance: WEIGHT_TOLERANCE,
            });
        }

        Ok(())
    }
}

/// Anything that can grade a block of extracted text.
pub trait TextScorer: Send + Sync {
    /// Score `text` extracted from `total_pages` pages.
    fn score(&self, text: &str, total_pages: usize, expected_language: Option<&str>) -> QualityReport;
}

/// Quality scorer over the six extraction signals.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: SignalWeights,
    density: DensityThresholds,
    expected_chars_per_page: f64,
}

impl QualityScorer {
    /// Create a scorer with custom weights and default thresholds.
    ///
    /// Fails when the weights do not sum to 1.0 (±0.01).
    pub fn new(weights: SignalWeights) -> Result<Self, QualityError> {
        Self::with_config(&QualityConfig {
            weights,
            ..QualityConfig::default()
        })
    }

    /// Create a scorer from the quality section of the configuration.
    pub fn with_config(config: &QualityConfig) -> Result<Self, QualityError> {
        config.weights.validate()?;

        debug!(
            "Quality scorer ready (weights sum {:.3}, density {:.0}/{:.0}/{:.0})",
            config.weights.sum(),
            config.density.min_chars_per_page,
            config.density.ideal_chars_per_page,
            config.density.max_chars_per_page
        );

        Ok(Self {
            weights: config.weights.clone(),
            density: config.density.clone(),
            expected_chars_per_page: config.expected_chars_per_page,
        })
    }

    /// Get the signal weights.
    pub fn weights(&self) -> &SignalWeights {
        &self.weights
    }

    /// Score a block of extracted text.
    pub fn score(
        &self,
        text: &str,
        total_pages: usize,
        expected_language: Option<&str>,
    ) -> QualityReport {
        let char_count = text.chars().count();
        let metadata = ReportMetadata {
            total_pages,
            text_length: char_count,
            expected_language: expected_language.map(str::to_string),
        };

        if text.trim().is_empty() {
            debug!("Empty extraction over {} pages scored 0.0", total_pages);
            return QualityReport::empty(metadata);
        }

        let w = &self.weights;
        let signals = vec![
            signals::text_density(char_count, total_pages, &self.density, w.text_density),
            signals::structure(text, w.structure),
            signals::encoding(text, w.encoding),
            signals::language(text, expected_language, w.language),
            signals::completeness(
                char_count,
                total_pages,
                self.expected_chars_per_page,
                w.completeness,
            ),
            signals::format_integrity(text, w.format_integrity),
        ];

        let report = QualityReport::from_signals(signals, metadata);
        debug!("{}", report.summary());
        report
    }

    /// Score per-page texts as one document.
    pub fn score_pages(&self, pages: &[&str], expected_language: Option<&str>) -> QualityReport {
        self.score(&pages.join("\n\n"), pages.len(), expected_language)
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            density: DensityThresholds::default(),
            expected_chars_per_page: QualityConfig::default().expected_chars_per_page,
        }
    }
}

impl TextScorer for QualityScorer {
    fn score(&self, text: &str, total_pages: usize, expected_language: Option<&str>) -> QualityReport {
        QualityScorer::score(self, text, total_pages, expected_language)
    }
}
