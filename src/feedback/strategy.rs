/*!
 * Extraction strategies and the fallback chain.
 *
 * Strategies are ordered from cheapest to most expensive; the default chain
 * follows that order and ends in manual review, which is never automated.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Mechanism used to obtain text from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Embedded text layer
    Text,
    /// Optical character recognition
    Ocr,
    /// Vision model transcription
    Vision,
    /// Human review; terminal
    ManualReview,
}

impl ExtractionStrategy {
    /// All strategies in escalation order
    pub const ALL: [ExtractionStrategy; 4] = [
        ExtractionStrategy::Text,
        ExtractionStrategy::Ocr,
        ExtractionStrategy::Vision,
        ExtractionStrategy::ManualReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ocr => "ocr",
            Self::Vision => "vision",
            Self::ManualReview => "manual_review",
        }
    }

    /// Whether the pipeline can run this strategy on its own
    pub fn is_automated(&self) -> bool {
        !matches!(self, Self::ManualReview)
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "text" => Ok(Self::Text),
            "ocr" => Ok(Self::Ocr),
            "vision" => Ok(Self::Vision),
            "manual_review" | "manual" => Ok(Self::ManualReview),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Ordered sequence of strategies tried on low quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackChain(Vec<ExtractionStrategy>);

impl FallbackChain {
    /// Create a custom chain.
    pub fn new(strategies: Vec<ExtractionStrategy>) -> Self {
        Self(strategies)
    }

    /// Strategies in order.
    pub fn strategies(&self) -> &[ExtractionStrategy] {
        &self.0
    }

    pub fn contains(&self, strategy: ExtractionStrategy) -> bool {
        self.0.contains(&strategy)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entry right after `strategy`.
    ///
    /// Strategies missing from the chain, the last entry and manual review
    /// itself all lead to manual review.
    pub fn next_after(&self, strategy: ExtractionStrategy) -> ExtractionStrategy {
        if strategy == ExtractionStrategy::ManualReview {
            return ExtractionStrategy::ManualReview;
        }

        self.0
            .iter()
            .position(|s| *s == strategy)
            .and_then(|index| self.0.get(index + 1))
            .copied()
            .unwrap_or(ExtractionStrategy::ManualReview)
    }

    /// Parse a chain from strategy names.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self(ExtractionStrategy::ALL.to_vec())
    }
}
