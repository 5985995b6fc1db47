//! Classifier capability and the adapter around it

use crate::error::{Result, ScoringError};
use crate::feature_extractor::FeatureVector;
use serde::Serialize;
use tracing::debug;

/// A pre-trained probabilistic binary classifier.
///
/// Implementations are loaded once at startup and only borrowed
/// immutably afterwards.
pub trait Classifier {
    /// Identifier used in logs (usually the artifact path)
    fn name(&self) -> &str;

    /// Feature order the classifier was trained with
    fn feature_names(&self) -> &[String];

    /// Importance scores, parallel to `feature_names`
    fn feature_importances(&self) -> &[f64];

    /// `[P(legitimate), P(fraud)]`
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2]>;

    /// Class label, 1 = fraud
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(label_for(self.predict_proba(features)?))
    }
}

/// Argmax over `[P(legitimate), P(fraud)]`. Ties go to class 0.
pub fn label_for([p0, p1]: [f64; 2]) -> u8 {
    u8::from(p1 > p0)
}

/// Tolerance on `p0 + p1 == 1`, absorbing f32 round-off from ONNX outputs
const SIMPLEX_TOLERANCE: f64 = 1e-6;

/// Label and fraud-class probability for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: u8,
    pub probability: f64,
}

/// Run the classifier on an encoded vector.
///
/// Rejects vectors whose columns differ from the classifier's declared
/// order, and classifier output outside the probability simplex.
pub fn predict(classifier: &dyn Classifier, features: &FeatureVector) -> Result<Prediction> {
    if features.names() != classifier.feature_names() {
        return Err(ScoringError::InferenceError(format!(
            "feature vector columns {:?} do not match classifier input {:?}",
            features.names(),
            classifier.feature_names()
        )));
    }

    let proba = classifier.predict_proba(features)?;
    let in_range = proba.iter().all(|p| (0.0..=1.0).contains(p));
    if !in_range || (proba[0] + proba[1] - 1.0).abs() > SIMPLEX_TOLERANCE {
        return Err(ScoringError::InferenceError(format!(
            "classifier returned invalid probabilities {proba:?}"
        )));
    }

    let label = label_for(proba);

    debug!(
        model = %classifier.name(),
        label = label,
        probability = proba[1],
        "Classifier prediction"
    );

    Ok(Prediction {
        label,
        probability: proba[1],
    })
}

/// Feature importance ranking, highest first. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    entries: Vec<(String, f64)>,
}

impl FeatureImportance {
    /// Rank a classifier's features by importance.
    ///
    /// Equal scores keep the classifier's declared order.
    pub fn from_classifier(classifier: &dyn Classifier) -> Result<Self> {
        let names = classifier.feature_names();
        let scores = classifier.feature_importances();

        if names.len() != scores.len() {
            return Err(ScoringError::model_unavailable(
                classifier.name(),
                format!(
                    "{} feature importances for {} features",
                    scores.len(),
                    names.len()
                ),
            ));
        }

        let mut entries: Vec<(String, f64)> = names
            .iter()
            .cloned()
            .zip(scores.iter().copied())
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// Names of the `n` most important features
    pub fn top(&self, n: usize) -> Vec<&str> {
        self.entries
            .iter()
            .take(n)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedClassifier;
    use super::*;
    use crate::feature_extractor::encode;
    use crate::types::transaction::{TransactionRecord, TransactionType};

    fn record() -> TransactionRecord {
        TransactionRecord {
            step: 1,
            transaction_type: TransactionType::Payment,
            amount: 500.0,
            old_balance_origin: 1_000.0,
            new_balance_origin: 500.0,
            old_balance_dest: 0.0,
            new_balance_dest: 500.0,
        }
    }

    #[test]
    fn test_predict_label_and_probability() {
        let classifier = FixedClassifier::new(0.7);
        let vector = encode(&record(), classifier.feature_names()).unwrap();

        let prediction = predict(&classifier, &vector).unwrap();
        assert_eq!(prediction.label, 1);
        assert!((prediction.probability - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_predict_tie_is_legitimate() {
        let classifier = FixedClassifier::new(0.5);
        let vector = encode(&record(), classifier.feature_names()).unwrap();

        assert_eq!(predict(&classifier, &vector).unwrap().label, 0);
    }

    #[test]
    fn test_predict_rejects_column_mismatch() {
        let classifier = FixedClassifier::new(0.2);
        let vector = encode(&record(), &["amount", "step"]).unwrap();

        assert!(matches!(
            predict(&classifier, &vector),
            Err(ScoringError::InferenceError(_))
        ));
    }

    #[test]
    fn test_predict_rejects_out_of_range_probability() {
        let classifier = FixedClassifier::new(1.5);
        let vector = encode(&record(), classifier.feature_names()).unwrap();

        assert!(matches!(
            predict(&classifier, &vector),
            Err(ScoringError::InferenceError(_))
        ));
    }

    /// Returns a fixed distribution and counts how often it is asked
    struct RawClassifier {
        proba: [f64; 2],
        calls: std::cell::Cell<usize>,
        inner: FixedClassifier,
    }

    impl RawClassifier {
        fn new(proba: [f64; 2]) -> Self {
            Self {
                proba,
                calls: std::cell::Cell::new(0),
                inner: FixedClassifier::new(0.0),
            }
        }
    }

    impl Classifier for RawClassifier {
        fn name(&self) -> &str {
            "raw"
        }

        fn feature_names(&self) -> &[String] {
            self.inner.feature_names()
        }

        fn feature_importances(&self) -> &[f64] {
            self.inner.feature_importances()
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<[f64; 2]> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.proba)
        }
    }

    #[test]
    fn test_predict_rejects_distribution_not_summing_to_one() {
        let template = FixedClassifier::new(0.0);
        let vector = encode(&record(), template.feature_names()).unwrap();

        for proba in [[0.0, 0.0], [0.6, 0.6], [0.2, 0.3]] {
            let classifier = RawClassifier::new(proba);
            assert!(
                matches!(
                    predict(&classifier, &vector),
                    Err(ScoringError::InferenceError(_))
                ),
                "{proba:?} accepted"
            );
        }

        let f32_round_off = RawClassifier::new([0.300_000_01, 0.7]);
        assert!(predict(&f32_round_off, &vector).is_ok());
    }

    #[test]
    fn test_predict_runs_classifier_once() {
        let classifier = RawClassifier::new([0.25, 0.75]);
        let vector = encode(&record(), classifier.feature_names()).unwrap();

        let prediction = predict(&classifier, &vector).unwrap();
        assert_eq!(prediction.label, 1);
        assert_eq!(classifier.calls.get(), 1);
    }

    #[test]
    fn test_label_for_argmax() {
        assert_eq!(label_for([0.9, 0.1]), 0);
        assert_eq!(label_for([0.5, 0.5]), 0);
        assert_eq!(label_for([0.1, 0.9]), 1);
    }

    #[test]
    fn test_feature_importance_sorted_descending() {
        let classifier = FixedClassifier::new(0.1);
        let importance = FeatureImportance::from_classifier(&classifier).unwrap();

        assert_eq!(importance.len(), 8);
        assert_eq!(importance.top(3), vec!["type_encoded", "balance_diff", "amount"]);
        assert!(importance
            .entries()
            .windows(2)
            .all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn test_feature_importance_ties_keep_declared_order() {
        let classifier = FixedClassifier::new(0.1)
            .with_features(&["step", "amount", "balance_diff"], &[0.25, 0.5, 0.25]);
        let importance = FeatureImportance::from_classifier(&classifier).unwrap();

        assert_eq!(importance.top(3), vec!["amount", "step", "balance_diff"]);
    }

    #[test]
    fn test_feature_importance_length_mismatch() {
        let classifier = FixedClassifier::new(0.1).with_features(&["step", "amount"], &[1.0]);

        assert!(matches!(
            FeatureImportance::from_classifier(&classifier),
            Err(ScoringError::ModelUnavailable { .. })
        ));
    }
}
