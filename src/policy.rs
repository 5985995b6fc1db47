//! Threshold-relative decision policy

use crate::error::{Result, ScoringError};
use crate::types::assessment::RiskTier;

/// Default decision threshold
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Lower edge of the manual-review band, as a fraction of the threshold
pub const MEDIUM_BAND_RATIO: f64 = 0.6;

/// Map a fraud probability to a risk tier relative to `threshold`.
///
/// `threshold = 0` never yields `Low`; `threshold = 1` only yields `High`
/// for `probability >= 1`.
pub fn classify(probability: f64, threshold: f64) -> RiskTier {
    if probability >= threshold {
        RiskTier::High
    } else if probability >= threshold * MEDIUM_BAND_RATIO {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Accept thresholds within [0, 1].
pub fn validate_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ScoringError::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify(0.7, 0.5), RiskTier::High);
        assert_eq!(classify(0.4, 0.5), RiskTier::Medium);
        assert_eq!(classify(0.1, 0.5), RiskTier::Low);
    }

    #[test]
    fn test_classify_boundaries() {
        for t in [0.1, 0.5, 0.7, 1.0] {
            assert_eq!(classify(t, t), RiskTier::High);
            assert_eq!(classify(0.6 * t, t), RiskTier::Medium);
            assert_eq!(classify(0.6 * t - 1e-9, t), RiskTier::Low);
        }
    }

    #[test]
    fn test_zero_threshold_never_low() {
        assert_eq!(classify(0.0, 0.0), RiskTier::High);
        assert_eq!(classify(0.3, 0.0), RiskTier::High);
    }

    #[test]
    fn test_unit_threshold_high_requires_certainty() {
        assert_eq!(classify(0.99, 1.0), RiskTier::Medium);
        assert_eq!(classify(1.0, 1.0), RiskTier::High);
    }

    #[test]
    fn test_validate_threshold() {
        assert_eq!(validate_threshold(0.0), Ok(0.0));
        assert_eq!(validate_threshold(1.0), Ok(1.0));
        assert_eq!(
            validate_threshold(1.5),
            Err(ScoringError::InvalidThreshold(1.5))
        );
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_classify_monotonic_in_probability(
            t in 0.0f64..=1.0,
            a in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo, t) <= classify(hi, t));
        }

        #[test]
        fn prop_classify_is_pure(p in 0.0f64..=1.0, t in 0.0f64..=1.0) {
            prop_assert_eq!(classify(p, t), classify(p, t));
        }
    }
}
