/*!
 * # docqa - Document extraction quality control and provider routing
 *
 * A Rust library that sits between document text extraction and LLM
 * translation in a document translation pipeline.
 *
 * ## Features
 *
 * - Score extracted text on six quality signals (density, structure,
 *   encoding, language, completeness, format integrity)
 * - Accept, retry or escalate extractions through a fallback chain of
 *   strategies (text, OCR, vision, manual review)
 * - Track per-provider call metrics by language pair and document type,
 *   with optional JSON persistence
 * - Route each translation call to the provider that best fits a mode:
 *   best quality, cheapest good enough, or balanced
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `quality`: Extraction quality scoring:
 *   - `quality::signals`: Individual signal computations
 *   - `quality::scorer`: Weighted combination and weight validation
 *   - `quality::report`: Scores, grades and recommendations
 * - `feedback`: Adaptive extraction:
 *   - `feedback::strategy`: Strategies and the fallback chain
 *   - `feedback::feedback_loop`: Accept/retry/escalate state machine
 * - `routing`: Quality-aware provider routing:
 *   - `routing::stats`: Thread-safe provider metrics
 *   - `routing::priors`: Cold-start provider expectations
 *   - `routing::router`: Candidate scoring and selection
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code and script utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod feedback;
pub mod language_utils;
pub mod quality;
pub mod routing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ConfigError, QualityError, StatsError};
pub use feedback::{ExtractionStrategy, Extractor, FeedbackAction, FeedbackLoop, FeedbackLoopResult, FeedbackResult};
pub use quality::{Grade, QualityReport, QualityScorer, SignalName, SignalWeights};
pub use routing::{CallRecord, ProviderRouter, RoutingDecision, RoutingMode, StatsTracker};
