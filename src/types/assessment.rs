//! Scoring outcome data structures

use crate::rationale::{NarrativeLevel, RiskSignal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold-relative risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Recommended action for the tier
    pub fn action(self) -> &'static str {
        match self {
            RiskTier::High => "block and notify security",
            RiskTier::Medium => "send for manual review",
            RiskTier::Low => "approve",
        }
    }

    /// Headline shown to the operator
    pub fn verdict(self) -> &'static str {
        match self {
            RiskTier::High => "FRAUD ALERT",
            RiskTier::Medium => "Suspicious Transaction",
            RiskTier::Low => "Legitimate Transaction",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring a single transaction. Lives for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    /// Class label reported by the classifier (1 = fraud)
    pub label: u8,
    /// Fraud-class probability (0.0 - 1.0)
    pub probability: f64,
    /// Tier from the threshold-relative decision policy
    pub tier: RiskTier,
    /// Fixed-scale narrative level; computed independently of `tier`
    pub narrative: NarrativeLevel,
    /// Rule-based signals, never empty
    pub signals: Vec<RiskSignal>,
    /// Markdown rationale
    pub summary: String,
}

impl ScoringResult {
    pub fn action(&self) -> &'static str {
        self.tier.action()
    }

    pub fn signal_messages(&self) -> Vec<String> {
        self.signals.iter().map(ToString::to_string).collect()
    }
}

/// Serializable report emitted for each scored transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringReport {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Position of the record in a batch input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,

    /// Decision threshold in effect
    pub threshold: f64,

    pub label: u8,

    pub probability: f64,

    pub tier: RiskTier,

    /// Recommended action for `tier`
    pub action: String,

    /// Fixed-scale narrative wording
    pub narrative: String,

    pub signals: Vec<String>,

    /// Markdown rationale
    pub summary: String,

    /// Highest-importance model features
    pub top_features: Vec<String>,

    /// Assessment timestamp
    pub assessed_at: DateTime<Utc>,
}

impl ScoringReport {
    /// Create a report from a scoring result
    pub fn new(result: &ScoringResult, threshold: f64) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            record_index: None,
            threshold,
            label: result.label,
            probability: result.probability,
            tier: result.tier,
            action: result.action().to_string(),
            narrative: result.narrative.to_string(),
            signals: result.signal_messages(),
            summary: result.summary.clone(),
            top_features: Vec::new(),
            assessed_at: Utc::now(),
        }
    }

    /// Attach the top model features shown in the rationale
    pub fn with_top_features(mut self, features: Vec<String>) -> Self {
        self.top_features = features;
        self
    }

    /// Attach the batch position of the scored record
    pub fn with_record_index(mut self, index: usize) -> Self {
        self.record_index = Some(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> ScoringResult {
        ScoringResult {
            label: 1,
            probability: 0.7,
            tier: RiskTier::High,
            narrative: NarrativeLevel::High,
            signals: vec![RiskSignal::HighAmount, RiskSignal::RiskyTransactionType],
            summary: "**Fraud Probability:** `0.70`".to_string(),
        }
    }

    #[test]
    fn test_tier_actions() {
        assert_eq!(RiskTier::High.action(), "block and notify security");
        assert_eq!(RiskTier::Medium.action(), "send for manual review");
        assert_eq!(RiskTier::Low.action(), "approve");
    }

    #[test]
    fn test_tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
    }

    #[test]
    fn test_report_serialization() {
        let report = ScoringReport::new(&sample_result(), 0.5)
            .with_top_features(vec!["amount".to_string(), "balance_diff".to_string()]);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""tier":"HIGH""#));
        assert!(!json.contains("record_index"));

        let deserialized: ScoringReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.assessment_id, deserialized.assessment_id);
        assert_eq!(deserialized.tier, RiskTier::High);
        assert_eq!(deserialized.action, "block and notify security");
        assert_eq!(deserialized.signals.len(), 2);
        assert_eq!(deserialized.top_features, vec!["amount", "balance_diff"]);
    }

    #[test]
    fn test_report_record_index() {
        let report = ScoringReport::new(&sample_result(), 0.5).with_record_index(7);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""record_index":7"#));
    }
}
