//! Error types for the scoring pipeline

use std::fmt::Display;
use thiserror::Error;

/// Failures surfaced by the scoring pipeline.
///
/// Every failure is reported once to the caller; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The model artifact is missing or corrupt. Fatal at startup.
    #[error("model unavailable ({model}): {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// The classifier requires a feature the encoder does not produce.
    #[error("schema mismatch: classifier requires unknown feature `{feature}`")]
    SchemaMismatch { feature: String },

    /// The classifier call failed for this request.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Decision threshold outside [0, 1].
    #[error("invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f64),

    /// Input record rejected before encoding.
    #[error("invalid transaction record: {0}")]
    InvalidRecord(String),
}

impl ScoringError {
    pub(crate) fn model_unavailable(model: impl Display, reason: impl Display) -> Self {
        ScoringError::ModelUnavailable {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScoringError>;
