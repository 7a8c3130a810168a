/*!
 * Quality report types.
 *
 * A report is computed fresh for every scoring call and never persisted:
 * - `SignalScore`: one of the six independent extraction signals
 * - `Grade`: deterministic A-F bucketing of the overall score
 * - `QualityReport`: weighted overall score with breakdown and recommendation
 */

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Minimum overall score for a report to count as passed
pub const PASS_THRESHOLD: f64 = 0.6;

/// Identifier of an extraction quality signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalName {
    /// Characters per page against the expected range
    TextDensity,
    /// Headings, lists and paragraphs among the lines
    Structure,
    /// Mojibake and invalid characters
    Encoding,
    /// Plausibility of the text as natural language
    Language,
    /// Extracted volume against a conservative minimum
    Completeness,
    /// Balance of math and markup delimiters
    FormatIntegrity,
}

impl SignalName {
    /// All signals in report order
    pub const ALL: [SignalName; 6] = [
        SignalName::TextDensity,
        SignalName::Structure,
        SignalName::Encoding,
        SignalName::Language,
        SignalName::Completeness,
        SignalName::FormatIntegrity,
    ];

    /// Stable identifier used in logs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextDensity => "text_density",
            Self::Structure => "structure",
            Self::Encoding => "encoding",
            Self::Language => "language",
            Self::Completeness => "completeness",
            Self::FormatIntegrity => "format_integrity",
        }
    }

    /// Corrective action suggested when this signal is the weakest
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            Self::TextDensity => {
                "Text density is off for the page count; re-extract with OCR/Vision."
            }
            Self::Structure => {
                "Document structure was lost; re-extract with Vision to recover the layout."
            }
            Self::Encoding => {
                "Encoding errors detected; re-extract with OCR/Vision or fix the source encoding."
            }
            Self::Language => {
                "Text does not read as natural language; re-extract with OCR/Vision."
            }
            Self::Completeness => "Extracted text looks incomplete; re-extract with OCR/Vision.",
            Self::FormatIntegrity => {
                "Formula or markup delimiters are broken; re-extract with Vision."
            }
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score of a single signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalScore {
    /// Which signal this is
    pub name: SignalName,
    /// Score value (0.0 - 1.0)
    pub score: f64,
    /// Weight in the overall score
    pub weight: f64,
    /// Human-readable explanation
    pub details: String,
}

impl SignalScore {
    /// Create a new signal score, clamping the score into [0, 1].
    pub fn new(name: SignalName, score: f64, weight: f64, details: impl Into<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            name,
            score,
            weight,
            details: details.into(),
        }
    }

    /// Weighted contribution to the overall score.
    pub fn weighted(&self) -> f64 {
        self.score * self.weight
    }

    /// Flat display representation.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name.as_str(),
            "score": round_to(self.score, 3),
            "weight": round_to(self.weight, 3),
            "details": self.details,
        })
    }
}

/// Letter grade of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Bucket a score: ≥0.9 A, ≥0.75 B, ≥0.6 C, ≥0.4 D, else F.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => Grade::A,
            s if s >= 0.75 => Grade::B,
            s if s >= 0.6 => Grade::C,
            s if s >= 0.4 => Grade::D,
            _ => Grade::F,
        }
    }

    /// Whether no corrective action is needed
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Grade::A | Grade::B)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context of a scoring call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// Pages the text was extracted from
    pub total_pages: usize,
    /// Length of the text in characters
    pub text_length: usize,
    /// Expected language code, if known
    pub expected_language: Option<String>,
}

/// Extraction quality report (EQS) with breakdown by signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Weighted overall score (0.0 - 1.0)
    pub overall_score: f64,
    /// Letter grade of the overall score
    pub grade: Grade,
    /// One entry per signal, in `SignalName::ALL` order; empty for empty text
    pub signals: Vec<SignalScore>,
    /// What the caller should do about the extraction
    pub recommendation: String,
    /// Context of the scoring call
    pub metadata: ReportMetadata,
}

impl QualityReport {
    /// Report for empty or whitespace-only text.
    pub fn empty(metadata: ReportMetadata) -> Self {
        Self {
            overall_score: 0.0,
            grade: Grade::F,
            signals: Vec::new(),
            recommendation: "No text was extracted; re-extract with OCR/Vision.".to_string(),
            metadata,
        }
    }

    /// Combine signal scores into a report.
    pub fn from_signals(signals: Vec<SignalScore>, metadata: ReportMetadata) -> Self {
        let overall_score = signals
            .iter()
            .map(SignalScore::weighted)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        let grade = Grade::from_score(overall_score);
        let recommendation = recommend(grade, &signals);

        Self {
            overall_score,
            grade,
            signals,
            recommendation,
            metadata,
        }
    }

    /// Whether the overall score meets the pass threshold.
    pub fn passed(&self) -> bool {
        self.overall_score >= PASS_THRESHOLD
    }

    /// Get the lowest scoring signal (first one on ties).
    pub fn weakest_signal(&self) -> Option<&SignalScore> {
        weakest(&self.signals)
    }

    /// Look up a signal by name.
    pub fn signal(&self, name: SignalName) -> Option<&SignalScore> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "EQS: {:.1}% (Grade: {}) - {} chars over {} pages",
            self.overall_score * 100.0,
            self.grade,
            self.metadata.text_length,
            self.metadata.total_pages
        )
    }

    /// Flat display representation with rounded floats.
    pub fn to_json(&self) -> Value {
        json!({
            "overall_score": round_to(self.overall_score, 4),
            "grade": self.grade.as_str(),
            "passed": self.passed(),
            "signals": self.signals.iter().map(SignalScore::to_json).collect::<Vec<_>>(),
            "recommendation": self.recommendation,
            "total_pages": self.metadata.total_pages,
            "text_length": self.metadata.text_length,
            "expected_language": self.metadata.expected_language,
        })
    }
}

fn weakest(signals: &[SignalScore]) -> Option<&SignalScore> {
    signals.iter().fold(None, |lowest: Option<&SignalScore>, candidate| match lowest {
        Some(current) if current.score <= candidate.score => Some(current),
        _ => Some(candidate),
    })
}

fn recommend(grade: Grade, signals: &[SignalScore]) -> String {
    match grade {
        Grade::A => "Extraction quality is excellent; no action needed.".to_string(),
        Grade::B => "Extraction quality is good; accept as-is.".to_string(),
        _ => match weakest(signals) {
            Some(signal) => format!(
                "Weakest signal: {} ({:.2}). {}",
                signal.name,
                signal.score,
                signal.name.remediation_hint()
            ),
            None => "No signals available; re-extract with OCR/Vision.".to_string(),
        },
    }
}

/// Round a float for display.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
