//! Feature encoding for fraud model inference.
//!
//! Turns a transaction into the numeric columns used during model training,
//! then selects and reorders them to the order the classifier declares.

use crate::error::{Result, ScoringError};
use crate::types::transaction::TransactionRecord;
use serde::Serialize;

/// Column names produced by the encoder, in canonical order.
pub const FEATURE_NAMES: [&str; 8] = [
    "step",
    "type_encoded",
    "amount",
    "oldbalanceOrg",
    "newbalanceOrig",
    "oldbalanceDest",
    "newbalanceDest",
    "balance_diff",
];

/// Ordered feature name/value pairs, keyed exactly by the classifier's
/// required order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if present
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Values as `f32`, for tensor-backed classifiers
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// Feature encoder that transforms transactions into model input features.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Raw features in canonical order.
    pub fn extract(&self, tx: &TransactionRecord) -> [(&'static str, f64); 8] {
        let values = [
            tx.step as f64,
            f64::from(tx.transaction_type.code()),
            tx.amount,
            tx.old_balance_origin,
            tx.new_balance_origin,
            tx.old_balance_dest,
            tx.new_balance_dest,
            tx.balance_diff(),
        ];

        std::array::from_fn(|i| (FEATURE_NAMES[i], values[i]))
    }

    /// Encode a transaction in the order the classifier requires.
    ///
    /// Columns the classifier does not ask for are dropped. A required name
    /// this encoder cannot produce is a `SchemaMismatch`.
    pub fn encode<S: AsRef<str>>(
        &self,
        tx: &TransactionRecord,
        required_order: &[S],
    ) -> Result<FeatureVector> {
        let raw = self.extract(tx);

        let mut names = Vec::with_capacity(required_order.len());
        let mut values = Vec::with_capacity(required_order.len());

        for required in required_order {
            let required = required.as_ref();
            let value = raw
                .iter()
                .find(|(name, _)| *name == required)
                .map(|&(_, value)| value)
                .ok_or_else(|| ScoringError::SchemaMismatch {
                    feature: required.to_string(),
                })?;

            names.push(required.to_string());
            values.push(value);
        }

        Ok(FeatureVector { names, values })
    }

    /// Check a classifier's declared order against the encoder up front.
    pub fn check_schema<S: AsRef<str>>(&self, required_order: &[S]) -> Result<()> {
        for name in required_order {
            let name = name.as_ref();
            if !FEATURE_NAMES.contains(&name) {
                return Err(ScoringError::SchemaMismatch {
                    feature: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

/// Encode `record` for a classifier declaring `required_order`.
pub fn encode<S: AsRef<str>>(
    record: &TransactionRecord,
    required_order: &[S],
) -> Result<FeatureVector> {
    FeatureExtractor::new().encode(record, required_order)
}
