//! Decision-forest classifier loaded from a JSON export.
//!
//! The export mirrors a fitted scikit-learn forest: the training feature
//! order, the impurity-based importances and, per tree, a flat node array
//! rooted at index 0. Leaves carry per-class weights (counts or fractions);
//! the forest probability is the mean of the normalised leaf distributions.

use crate::error::{Result, ScoringError};
use crate::feature_extractor::FeatureVector;
use crate::models::classifier::Classifier;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Tree node. Samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Normalised class distribution of the leaf reached by `x`.
    ///
    /// Children always sit after their parent, which `validate` enforces,
    /// so the walk terminates.
    fn leaf_distribution(&self, x: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => {
                    let total = value[0] + value[1];
                    return [value[0] / total, value[1] / total];
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { value } => {
                    let total = value[0] + value[1];
                    let valid = value.iter().all(|w| w.is_finite() && *w >= 0.0);
                    if !valid || !total.is_finite() || total <= 0.0 {
                        return Err(format!("leaf {idx} has invalid class weights {value:?}"));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Forest classifier deserialized from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    #[serde(skip)]
    name: String,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
    trees: Vec<Tree>,
}

impl ForestModel {
    /// Load and validate a forest export from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::model_unavailable(&name, e))?;

        let model = Self::from_json(&raw, &name)?;

        info!(
            model = %name,
            trees = model.tree_count(),
            features = model.feature_names.len(),
            "Forest model loaded"
        );

        Ok(model)
    }

    /// Parse and validate a forest export
    pub fn from_json(json: &str, name: &str) -> Result<Self> {
        let mut model: ForestModel =
            serde_json::from_str(json).map_err(|e| ScoringError::model_unavailable(name, e))?;
        model.name = name.to_string();
        model
            .validate()
            .map_err(|reason| ScoringError::model_unavailable(name, reason))?;
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let n_features = self.feature_names.len();

        if n_features == 0 {
            return Err("model declares no features".to_string());
        }
        if self.feature_importances.len() != n_features {
            return Err(format!(
                "{} feature importances for {} features",
                self.feature_importances.len(),
                n_features
            ));
        }
        if self.trees.is_empty() {
            return Err("model has no trees".to_string());
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|reason| format!("tree {i}: {reason}"))?;
        }

        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2]> {
        let x = features.values();

        if x.len() != self.feature_names.len() {
            return Err(ScoringError::InferenceError(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                x.len()
            )));
        }
        if let Some((name, value)) = features.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ScoringError::InferenceError(format!(
                "feature {name} is not finite ({value})"
            )));
        }

        let mut proba = [0.0; 2];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_distribution(x);
            proba[0] += p0;
            proba[1] += p1;
        }

        let n = self.trees.len() as f64;
        Ok([proba[0] / n, proba[1] / n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::encode;
    use crate::types::transaction::{TransactionRecord, TransactionType};

    const MODEL: &str = r#"{
        "feature_names": ["amount", "type_encoded"],
        "feature_importances": [0.7, 0.3],
        "trees": [
            {"nodes": [
                {"feature": 0, "threshold": 1000.0, "left": 1, "right": 2},
                {"value": [9, 1]},
                {"value": [1, 3]}
            ]},
            {"nodes": [
                {"feature": 1, "threshold": 2.5, "left": 1, "right": 2},
                {"value": [0.4, 0.6]},
                {"value": [1.0, 0.0]}
            ]}
        ]
    }"#;

    fn record(tx_type: TransactionType, amount: f64) -> TransactionRecord {
        TransactionRecord {
            step: 1,
            transaction_type: tx_type,
            amount,
            old_balance_origin: amount,
            new_balance_origin: 0.0,
            old_balance_dest: 0.0,
            new_balance_dest: amount,
        }
    }

    fn model() -> ForestModel {
        ForestModel::from_json(MODEL, "test").unwrap()
    }

    #[test]
    fn test_forest_averages_normalised_leaves() {
        let model = model();
        let x = encode(&record(TransactionType::Transfer, 5_000.0), model.feature_names()).unwrap();

        // tree 1: [1, 3] -> 0.75, tree 2: [0.4, 0.6] -> 0.6
        let [p0, p1] = model.predict_proba(&x).unwrap();
        assert!((p1 - 0.675).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&x).unwrap(), 1);
    }

    #[test]
    fn test_forest_split_goes_left_on_equal() {
        let model = model();
        let x = encode(&record(TransactionType::Payment, 1_000.0), model.feature_names()).unwrap();

        // tree 1: [9, 1] -> 0.1, tree 2: [1, 0] -> 0.0
        let [_, p1] = model.predict_proba(&x).unwrap();
        assert!((p1 - 0.05).abs() < 1e-12);
        assert_eq!(model.predict(&x).unwrap(), 0);
    }

    #[test]
    fn test_forest_rejects_wrong_width() {
        let model = model();
        let x = encode(&record(TransactionType::Payment, 10.0), &["amount"]).unwrap();

        assert!(matches!(
            model.predict_proba(&x),
            Err(ScoringError::InferenceError(_))
        ));
    }

    #[test]
    fn test_forest_rejects_backward_child() {
        let json = r#"{
            "feature_names": ["amount"],
            "feature_importances": [1.0],
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"value": [1, 1]}
            ]}]
        }"#;

        let err = ForestModel::from_json(json, "cyclic").unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("invalid child 0"));
    }

    #[test]
    fn test_forest_rejects_importance_length_mismatch() {
        let json = r#"{
            "feature_names": ["amount", "step"],
            "feature_importances": [1.0],
            "trees": [{"nodes": [{"value": [1, 1]}]}]
        }"#;

        assert!(ForestModel::from_json(json, "bad").is_err());
    }

    #[test]
    fn test_forest_rejects_empty_leaf() {
        let json = r#"{
            "feature_names": ["amount"],
            "feature_importances": [1.0],
            "trees": [{"nodes": [{"value": [0, 0]}]}]
        }"#;

        assert!(ForestModel::from_json(json, "bad").is_err());
    }

    #[test]
    fn test_forest_rejects_overflowing_leaf() {
        let json = r#"{
            "feature_names": ["amount"],
            "feature_importances": [1.0],
            "trees": [{"nodes": [{"value": [1e308, 1e308]}]}]
        }"#;

        let err = ForestModel::from_json(json, "overflow").unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_forest_rejects_garbage() {
        let err = ForestModel::from_json("not json", "garbage").unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ForestModel::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable { .. }));
    }
}
