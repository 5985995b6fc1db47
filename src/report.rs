//! Plain-text rendering of scoring results for the terminal.

use crate::models::classifier::FeatureImportance;
use crate::types::assessment::ScoringResult;
use std::fmt::Write as _;

/// Width of the longest importance bar
pub const CHART_WIDTH: usize = 40;

/// Verdict block: headline, tier, probability, action, then the rationale.
pub fn render_verdict(result: &ScoringResult, threshold: f64) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", result.tier.verdict());
    let _ = writeln!(out, "Risk tier:         {}", result.tier);
    let _ = writeln!(out, "Fraud probability: {:.2}", result.probability);
    let _ = writeln!(out, "Threshold:         {threshold:.2}");
    let _ = writeln!(out, "Action:            {}", result.action());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.summary);

    out
}

/// Horizontal bar chart of feature importances, highest first.
pub fn render_importance_chart(importance: &FeatureImportance, width: usize) -> String {
    let entries = importance.entries();
    let max = entries.first().map(|(_, score)| *score).unwrap_or(0.0);
    let label_width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (name, score) in entries {
        let len = if max > 0.0 {
            ((score / max) * width as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{name:<label_width$} {:<width$} {score:.4}",
            "█".repeat(len.min(width)),
        );
    }

    out
}
