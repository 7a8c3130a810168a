/*!
 * Extraction quality scoring.
 *
 * This module grades text produced by an extraction mechanism (fast text,
 * OCR, vision) against six independent signals:
 * - **Signals**: the individual signal computations and their tunables
 * - **Scorer**: weight validation and the weighted combination
 * - **Report**: the resulting score, grade and recommendation
 */

pub mod report;
pub mod scorer;
pub mod signals;

// Re-export main types
pub use report::{Grade, PASS_THRESHOLD, QualityReport, ReportMetadata, SignalName, SignalScore};
pub use scorer::{QualityScorer, SignalWeights, TextScorer};
pub use signals::DensityThresholds;
