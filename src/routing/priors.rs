/*!
 * Cold-start provider priors.
 *
 * Fixed per-provider expectations used when too little history exists to
 * route on real data, together with the language pairs and document types
 * each provider is known to handle well.
 */

use serde::{Deserialize, Serialize};

use crate::language_utils::normalize_language_pair;

/// Quality added when the language pair is in the provider's affinity list
pub const AFFINITY_QUALITY_BOOST: f64 = 0.05;

/// Quality added when the document type is one of the provider's strengths
pub const STRENGTH_QUALITY_BOOST: f64 = 0.03;

/// Fixed expectations for a provider with no history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPrior {
    /// Provider identifier, as reported in call records
    pub name: String,

    /// Expected translation quality (0.0 - 1.0)
    pub quality: f64,

    /// Expected cost in USD per thousand tokens
    pub cost_per_1k_tokens: f64,

    /// Expected call latency in milliseconds
    pub latency_ms: f64,

    /// Expected share of successful calls
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,

    /// Language pairs (`src→tgt`) the provider handles especially well
    #[serde(default)]
    pub language_affinities: Vec<String>,

    /// Document types the provider handles especially well
    #[serde(default)]
    pub document_strengths: Vec<String>,
}

fn default_success_rate() -> f64 {
    0.95
}

impl ProviderPrior {
    /// Create a prior without affinities or strengths.
    pub fn new(name: &str, quality: f64, cost_per_1k_tokens: f64, latency_ms: f64) -> Self {
        Self {
            name: name.to_string(),
            quality,
            cost_per_1k_tokens,
            latency_ms,
            success_rate: default_success_rate(),
            language_affinities: Vec::new(),
            document_strengths: Vec::new(),
        }
    }

    pub fn with_affinities(mut self, pairs: &[&str]) -> Self {
        self.language_affinities = pairs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_strengths(mut self, document_types: &[&str]) -> Self {
        self.document_strengths = document_types.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Whether the language pair is one of the provider's affinities
    pub fn has_affinity(&self, language_pair: &str) -> bool {
        let pair = normalize_language_pair(language_pair);
        self.language_affinities
            .iter()
            .any(|p| normalize_language_pair(p) == pair)
    }

    /// Whether the document type is one of the provider's strengths
    pub fn has_strength(&self, document_type: &str) -> bool {
        let wanted = document_type.trim().to_lowercase();
        self.document_strengths
            .iter()
            .any(|d| d.trim().to_lowercase() == wanted)
    }

    /// Prior quality plus affinity and strength boosts, capped at 1.0.
    pub fn effective_quality(&self, language_pair: &str, document_type: &str) -> f64 {
        let mut quality = self.quality;
        if self.has_affinity(language_pair) {
            quality += AFFINITY_QUALITY_BOOST;
        }
        if self.has_strength(document_type) {
            quality += STRENGTH_QUALITY_BOOST;
        }
        quality.min(1.0)
    }
}

/// Built-in priors, in default preference order.
pub fn default_priors() -> Vec<ProviderPrior> {
    vec![
        ProviderPrior::new("anthropic", 0.90, 0.015, 3000.0)
            .with_affinities(&["ja→en", "en→ja", "de→en", "en→de", "fr→en", "en→fr"])
            .with_strengths(&["academic", "legal", "literary"]),
        ProviderPrior::new("openai", 0.88, 0.010, 2500.0)
            .with_affinities(&["en→es", "es→en", "en→fr", "en→zh", "en→pt"])
            .with_strengths(&["technical", "general"]),
        ProviderPrior::new("gemini", 0.85, 0.004, 2000.0)
            .with_affinities(&["en→hi", "hi→en", "ko→en", "en→ko"])
            .with_strengths(&["general", "presentation"]),
        ProviderPrior::new("deepseek", 0.82, 0.002, 4000.0)
            .with_affinities(&["zh→en", "en→zh"])
            .with_strengths(&["technical", "academic"]),
        ProviderPrior {
            success_rate: 0.90,
            ..ProviderPrior::new("ollama", 0.70, 0.0, 6000.0)
        },
    ]
}
