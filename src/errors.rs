/*!
 * Error types for the docqa library.
 *
 * This module contains custom error types for the different parts of the
 * quality-control and routing layer, using the thiserror crate for ergonomic
 * error definitions.
 *
 * Only `QualityError` is ever surfaced to callers of the scoring, feedback and
 * routing operations. Persistence errors are absorbed and logged by the stats
 * tracker so the pipeline it supports is never blocked.
 */

use thiserror::Error;

/// Errors raised while constructing a quality scorer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    /// Signal weights must sum to 1.0 (within tolerance)
    #[error("Signal weights must sum to 1.0 (±{tolerance}), got {sum:.4}")]
    InvalidWeights {
        /// Actual sum of the supplied weights
        sum: f64,
        /// Accepted tolerance around 1.0
        tolerance: f64,
    },

    /// A single weight is negative or not a finite number
    #[error("Signal weight for '{signal}' must be a finite, non-negative number, got {value}")]
    InvalidWeight {
        /// Signal the weight belongs to
        signal: String,
        /// Offending value
        value: f64,
    },
}

/// Errors found while validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric setting is outside its accepted range
    #[error("Invalid value for '{field}': {message}")]
    OutOfRange {
        /// Dotted path of the setting
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Signal weights are invalid
    #[error("Quality weights are invalid: {0}")]
    Weights(#[from] QualityError),

    /// An extraction strategy name could not be parsed
    #[error("Unknown extraction strategy: {0}")]
    UnknownStrategy(String),

    /// A routing mode name could not be parsed
    #[error("Unknown routing mode: {0}")]
    UnknownMode(String),

    /// The provider list is empty or inconsistent
    #[error("Provider configuration error: {0}")]
    Providers(String),

    /// A language code is not a valid ISO 639 code
    #[error("Invalid language code: {0}")]
    Language(String),
}

/// Errors from stats persistence
#[derive(Error, Debug)]
pub enum StatsError {
    /// Reading or writing the stats file failed
    #[error("Stats file I/O failed for {path}: {source}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The stats file could not be (de)serialized
    #[error("Stats file is not valid JSON ({path}): {source}")]
    Serialization {
        /// File involved
        path: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from scorer construction
    #[error("Quality error: {0}")]
    Quality(#[from] QualityError),

    /// Error from configuration validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from stats persistence
    #[error("Stats error: {0}")]
    Stats(#[from] StatsError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
