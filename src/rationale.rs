//! Rule-based rationale for a scored transaction.
//!
//! Signals come from fixed rules over the raw fields. The closing decision
//! line uses its own fixed probability scale and never consults the
//! operator's threshold, so it can disagree with the policy tier near band
//! edges. Model feature importances are shown for context only and do not
//! influence which rules fire.

use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Amount above which a transaction is flagged
pub const HIGH_AMOUNT: f64 = 200_000.0;

/// Absolute sender balance change above which a transaction is flagged
pub const LARGE_BALANCE_DIFF: f64 = 100_000.0;

/// Narrative scale cut-offs
pub const NARRATIVE_HIGH: f64 = 0.5;
pub const NARRATIVE_MEDIUM: f64 = 0.3;

/// Number of top-importance features quoted in the summary
pub const TOP_FEATURES: usize = 3;

/// Human-readable reason attached to a scoring decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    HighAmount,
    LargeBalanceDifference,
    RiskyTransactionType,
    /// Placeholder when no rule fires
    NoStrongIndicators,
}

impl fmt::Display for RiskSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskSignal::HighAmount => "high transaction amount",
            RiskSignal::LargeBalanceDifference => "large balance difference after transaction",
            RiskSignal::RiskyTransactionType => "risky transaction type (TRANSFER / CASH_OUT)",
            RiskSignal::NoStrongIndicators => "no strong fraud indicators detected",
        })
    }
}

/// Fixed-scale narrative risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeLevel {
    Low,
    Medium,
    High,
}

impl NarrativeLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= NARRATIVE_HIGH {
            NarrativeLevel::High
        } else if probability >= NARRATIVE_MEDIUM {
            NarrativeLevel::Medium
        } else {
            NarrativeLevel::Low
        }
    }
}

impl fmt::Display for NarrativeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NarrativeLevel::High => "high risk",
            NarrativeLevel::Medium => "medium risk",
            NarrativeLevel::Low => "low risk",
        })
    }
}

/// Signals, narrative level and composed markdown summary
#[derive(Debug, Clone, PartialEq)]
pub struct Rationale {
    pub signals: Vec<RiskSignal>,
    pub narrative: NarrativeLevel,
    pub summary: String,
}

/// Evaluate the signal rules in their fixed order. Never empty.
pub fn detect_signals(record: &TransactionRecord) -> Vec<RiskSignal> {
    let mut signals = Vec::new();

    if record.amount > HIGH_AMOUNT {
        signals.push(RiskSignal::HighAmount);
    }

    if record.balance_diff().abs() > LARGE_BALANCE_DIFF {
        signals.push(RiskSignal::LargeBalanceDifference);
    }

    if matches!(record.transaction_type.code(), 1 | 2) {
        signals.push(RiskSignal::RiskyTransactionType);
    }

    if signals.is_empty() {
        signals.push(RiskSignal::NoStrongIndicators);
    }

    signals
}

/// Build the rationale for a scored transaction.
pub fn explain<S: AsRef<str>>(
    record: &TransactionRecord,
    probability: f64,
    top_features: &[S],
) -> Rationale {
    let signals = detect_signals(record);
    let narrative = NarrativeLevel::from_probability(probability);
    let summary = compose_summary(probability, &signals, narrative, top_features);

    Rationale {
        signals,
        narrative,
        summary,
    }
}

fn compose_summary<S: AsRef<str>>(
    probability: f64,
    signals: &[RiskSignal],
    narrative: NarrativeLevel,
    top_features: &[S],
) -> String {
    let mut summary = format!("**Fraud Probability:** `{probability:.2}`\n\n**Detected Risk Signals:**\n");

    for signal in signals {
        // Writing into a String cannot fail.
        let _ = writeln!(summary, "- {signal}");
    }

    if !top_features.is_empty() {
        let quoted: Vec<String> = top_features
            .iter()
            .map(|name| format!("`{}`", name.as_ref()))
            .collect();
        let _ = write!(summary, "\n**Top Model Features:** {}\n", quoted.join(", "));
    }

    let _ = write!(summary, "\n**Final Decision:** {narrative} transaction");
    summary
}
