//! Scoring statistics for batch runs.

use crate::types::assessment::RiskTier;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::info;

/// Processing-time samples kept for percentiles
const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for one batch run
pub struct ScoringMetrics {
    /// Transactions scored successfully
    transactions_scored: u64,
    /// Records skipped or failed
    failures: u64,
    by_tier: BTreeMap<RiskTier, u64>,
    /// Processing times (in microseconds)
    processing_times: Vec<u64>,
    /// Fraud probability distribution buckets
    probability_buckets: [u64; 10],
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: 0,
            failures: 0,
            by_tier: BTreeMap::new(),
            processing_times: Vec::with_capacity(1000),
            probability_buckets: [0; 10],
            start_time: Instant::now(),
        }
    }

    /// Record a scored transaction
    pub fn record_scored(&mut self, processing_time: Duration, probability: f64, tier: RiskTier) {
        self.transactions_scored += 1;

        self.processing_times.push(processing_time.as_micros() as u64);
        if self.processing_times.len() > MAX_SAMPLES {
            self.processing_times.drain(0..MAX_SAMPLES / 2);
        }

        let bucket = (probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        self.probability_buckets[bucket] += 1;

        *self.by_tier.entry(tier).or_insert(0) += 1;
    }

    /// Record a record that could not be scored
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn transactions_scored(&self) -> u64 {
        self.transactions_scored
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        if self.processing_times.is_empty() {
            return ProcessingStats::default();
        }
        let mut sorted = self.processing_times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
    }

    pub fn get_tier_counts(&self) -> &BTreeMap<RiskTier, u64> {
        &self.by_tier
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let scored = self.transactions_scored;
        let failures = self.failures;
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let tiers = self.get_tier_counts();
        let distribution = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              FRAUD RISK SCORER - BATCH SUMMARY               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Scored: {:>8}  │  Throughput: {:>8.1} tx/s  ║",
            scored, throughput
        );
        info!("║ Failed / Skipped:    {:>8}                                 ║", failures);
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Transactions by Risk Tier:                                   ║");
        for (tier, count) in tiers {
            let pct = if scored > 0 {
                (*count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:8}: {:>8} ({:>5.1}%)                                ║", tier.as_str(), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:                              ║");
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if scored > 0 {
                (count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let mut metrics = ScoringMetrics::new();

        metrics.record_scored(Duration::from_micros(100), 0.05, RiskTier::Low);
        metrics.record_scored(Duration::from_micros(300), 0.8, RiskTier::High);
        metrics.record_scored(Duration::from_micros(200), 1.0, RiskTier::High);
        metrics.record_failure();

        assert_eq!(metrics.transactions_scored(), 3);
        assert_eq!(metrics.failures(), 1);

        let tiers = metrics.get_tier_counts();
        assert_eq!(tiers.get(&RiskTier::High), Some(&2));
        assert_eq!(tiers.get(&RiskTier::Medium), None);

        let distribution = metrics.get_probability_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[8], 1);
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let mut metrics = ScoringMetrics::new();
        assert_eq!(metrics.get_processing_stats(), ProcessingStats::default());

        for us in [100, 200, 300, 400] {
            metrics.record_scored(Duration::from_micros(us), 0.1, RiskTier::Low);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_processing_samples_are_bounded() {
        let mut metrics = ScoringMetrics::new();
        for us in 0..(MAX_SAMPLES as u64 + 1) {
            metrics.record_scored(Duration::from_micros(us), 0.5, RiskTier::Medium);
        }

        assert_eq!(metrics.transactions_scored(), MAX_SAMPLES as u64 + 1);
        assert_eq!(metrics.get_processing_stats().count, MAX_SAMPLES as u64 / 2 + 1);
        let total = MAX_SAMPLES as u64 + 1;
        assert_eq!(metrics.get_tier_counts().get(&RiskTier::Medium), Some(&total));
        assert_eq!(metrics.get_probability_distribution()[5], total);
    }
}
