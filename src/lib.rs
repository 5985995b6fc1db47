//! Fraud Risk Scorer Library
//!
//! Scores payment transactions with a pre-trained binary classifier:
//! encodes the raw fields into the classifier's feature order, maps the
//! fraud probability to a threshold-relative risk tier, and explains the
//! decision with rule-based risk signals.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod rationale;
pub mod report;
pub mod types;

pub use config::AppConfig;
pub use error::{Result, ScoringError};
pub use feature_extractor::{encode, FeatureExtractor, FeatureVector};
pub use models::{Classifier, FeatureImportance, ModelLoader};
pub use pipeline::ScoringContext;
pub use policy::classify;
pub use rationale::{explain, NarrativeLevel, Rationale, RiskSignal};
pub use types::{RiskTier, ScoringReport, ScoringResult, TransactionRecord, TransactionType};
