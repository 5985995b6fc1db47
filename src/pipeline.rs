//! Scoring context and the per-request pipeline.
//!
//! The context is built once at startup and holds the only shared state:
//! the classifier and its feature-importance ranking. Scoring a request
//! borrows it immutably.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::feature_extractor::{FeatureExtractor, FeatureVector};
use crate::models::classifier::{self, Classifier, FeatureImportance, Prediction};
use crate::models::loader::ModelLoader;
use crate::policy;
use crate::rationale::{self, TOP_FEATURES};
use crate::types::assessment::ScoringResult;
use crate::types::transaction::TransactionRecord;
use tracing::{debug, info};

/// Immutable scoring context
pub struct ScoringContext {
    classifier: Box<dyn Classifier>,
    importance: FeatureImportance,
    extractor: FeatureExtractor,
}

impl ScoringContext {
    /// Wrap an already loaded classifier.
    ///
    /// Fails with `SchemaMismatch` if the classifier needs a feature the
    /// encoder cannot produce.
    pub fn new(classifier: Box<dyn Classifier>) -> Result<Self> {
        let extractor = FeatureExtractor::new();
        extractor.check_schema(classifier.feature_names())?;

        let importance = FeatureImportance::from_classifier(classifier.as_ref())?;

        info!(
            model = %classifier.name(),
            features = classifier.feature_names().len(),
            top_features = ?importance.top(TOP_FEATURES),
            "Scoring context ready"
        );

        Ok(Self {
            classifier,
            importance,
            extractor,
        })
    }

    /// Load the configured model artifact and build the context
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let classifier = ModelLoader::with_threads(config.onnx_threads)
            .load(&config.path, config.format)?;
        Self::new(classifier)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn feature_importance(&self) -> &FeatureImportance {
        &self.importance
    }

    /// Feature names quoted in every rationale
    pub fn top_features(&self) -> Vec<&str> {
        self.importance.top(TOP_FEATURES)
    }

    /// Encode a record in the classifier's feature order
    pub fn encode(&self, record: &TransactionRecord) -> Result<FeatureVector> {
        self.extractor
            .encode(record, self.classifier.feature_names())
    }

    /// Encode and run the classifier
    pub fn predict(&self, record: &TransactionRecord) -> Result<Prediction> {
        let features = self.encode(record)?;
        classifier::predict(self.classifier.as_ref(), &features)
    }

    /// Score one transaction against `threshold`.
    ///
    /// The policy tier and the rationale's narrative level are computed
    /// separately and may disagree.
    pub fn score(&self, record: &TransactionRecord, threshold: f64) -> Result<ScoringResult> {
        let prediction = self.predict(record)?;

        let tier = policy::classify(prediction.probability, threshold);
        let rationale = rationale::explain(record, prediction.probability, &self.top_features());

        debug!(
            transaction_type = %record.transaction_type,
            amount = record.amount,
            probability = prediction.probability,
            threshold = threshold,
            tier = %tier,
            narrative = %rationale.narrative,
            "Transaction scored"
        );

        Ok(ScoringResult {
            label: prediction.label,
            probability: prediction.probability,
            tier,
            narrative: rationale.narrative,
            signals: rationale.signals,
            summary: rationale.summary,
        })
    }
}
