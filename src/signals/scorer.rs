// =============================================================================
// Composite Scorer — sum, clamp, truncate, classify
// =============================================================================
//
//   raw   = sum of every normalized contribution
//   score = trunc(clamp(raw, 0, 100))
//
// Pure: the same `SignalSet` always produces the same `ScoringResult`.

use serde::{Deserialize, Serialize};

use crate::signals::classifier::{classify_score, RiskLevel};
use crate::signals::normalizer::{normalize, SignalContribution};
use crate::signals::snapshot::SignalSet;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Result of the composite scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Sum of contributions before clamping.
    pub raw_total: f64,
    /// Final score in [0, 100].
    pub score: u8,
    pub risk_level: RiskLevel,
    pub signal_contributions: Vec<SignalContribution>,
}

/// Clamp and truncate a raw sum into the [0, 100] integer score.
///
/// Non-finite sums score 0.
pub fn clamp_score(raw_total: f64) -> u8 {
    if !raw_total.is_finite() {
        return 0;
    }
    raw_total.clamp(SCORE_MIN, SCORE_MAX).trunc() as u8
}

/// The composite cycle-top scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScorer;

impl CompositeScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a signal snapshot.
    pub fn score(&self, signals: &SignalSet) -> ScoringResult {
        let contributions = normalize(signals);
        let raw_total: f64 = contributions.iter().map(|c| c.contribution).sum();
        let score = clamp_score(raw_total);

        ScoringResult {
            raw_total,
            score,
            risk_level: classify_score(score),
            signal_contributions: contributions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::PiCycleState;
    use crate::signals::normalizer::SignalKind;
    use chrono::Utc;

    fn pi_state(active: bool, distance: f64) -> PiCycleState {
        PiCycleState {
            timestamp: Utc::now(),
            price: 30_000.0,
            short_term_average: 0.0,
            long_term_average: 0.0,
            signal_active: active,
            distance_value: distance,
            raw_gap: distance,
        }
    }

    fn contribution(result: &ScoringResult, kind: SignalKind) -> f64 {
        result
            .signal_contributions
            .iter()
            .find(|c| c.signal == kind)
            .map(|c| c.contribution)
            .unwrap()
    }

    #[test]
    fn full_bull_scenario_clamps_to_100() {
        let signals = SignalSet {
            price: Some(30_000.0),
            fear_greed_index: Some(75.0),
            fear_greed_label: Some("Greed".into()),
            trend_score: Some(50.0),
            volume_ratio: Some(2.5),
            dominance_percent: Some(38.0),
            rsi: None,
            macd_average: None,
            pi_cycle: Some(pi_state(true, 12.0)),
        };
        let result = CompositeScorer::new().score(&signals);

        assert!((contribution(&result, SignalKind::Price) - 30.0).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::FearGreed) - 22.5).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::Trend) - 15.0).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::VolumeRatio) - 15.0).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::Dominance) - 10.0).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::PiCycleActive) - 15.0).abs() < 1e-9);
        assert!((contribution(&result, SignalKind::PiCycleDistance) - 1.2).abs() < 1e-9);
        assert!((result.raw_total - 108.7).abs() < 1e-9);
        assert_eq!(result.score, 100);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn empty_set_scores_zero() {
        let result = CompositeScorer::new().score(&SignalSet::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.raw_total, 0.0);
        assert_eq!(result.risk_level, RiskLevel::ModerateLow);
    }

    #[test]
    fn negative_sum_clamps_to_zero() {
        let signals = SignalSet {
            macd_average: Some(-500.0),
            price: Some(10_000.0),
            ..SignalSet::default()
        };
        let result = CompositeScorer::new().score(&signals);
        assert!(result.raw_total < 0.0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn fractional_sum_truncates() {
        // Price capped at 40, so 40 + 25.5 = 65.5.
        let signals = SignalSet {
            price: Some(45_900.0),
            fear_greed_index: Some(85.0),
            ..SignalSet::default()
        };
        let result = CompositeScorer::new().score(&signals);
        assert_eq!(result.score, 65);
        assert_eq!(result.risk_level, RiskLevel::ModerateLow);

        let signals = SignalSet {
            price: Some(39_999.0),
            fear_greed_index: Some(100.0),
            rsi: Some(19.0),
            ..SignalSet::default()
        };
        // 39.999 + 30 + 1.9 = 71.899
        let result = CompositeScorer::new().score(&signals);
        assert_eq!(result.score, 71);
        assert_eq!(result.risk_level, RiskLevel::Elevated);
    }

    #[test]
    fn every_subset_stays_in_range() {
        let full = SignalSet {
            price: Some(120_000.0),
            fear_greed_index: Some(95.0),
            fear_greed_label: None,
            trend_score: Some(100.0),
            volume_ratio: Some(3.0),
            dominance_percent: Some(35.0),
            rsi: Some(90.0),
            macd_average: Some(-40.0),
            pi_cycle: Some(pi_state(true, 40.0)),
        };
        for mask in 0u32..(1 << 8) {
            let bit = |i: u32| mask & (1 << i) != 0;
            let subset = SignalSet {
                price: full.price.filter(|_| bit(0)),
                fear_greed_index: full.fear_greed_index.filter(|_| bit(1)),
                fear_greed_label: None,
                trend_score: full.trend_score.filter(|_| bit(2)),
                volume_ratio: full.volume_ratio.filter(|_| bit(3)),
                dominance_percent: full.dominance_percent.filter(|_| bit(4)),
                rsi: full.rsi.filter(|_| bit(5)),
                macd_average: full.macd_average.filter(|_| bit(6)),
                pi_cycle: full.pi_cycle.clone().filter(|_| bit(7)),
            };
            let result = CompositeScorer::new().score(&subset);
            assert!(result.score <= 100, "mask {mask:#b}");
            if mask == 0 {
                assert_eq!(result.score, 0);
            }
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let signals = SignalSet {
            price: Some(64_000.0),
            fear_greed_index: Some(55.0),
            trend_score: Some(23.0),
            volume_ratio: Some(1.7),
            dominance_percent: Some(52.0),
            rsi: Some(61.0),
            pi_cycle: Some(pi_state(false, 0.0)),
            ..SignalSet::default()
        };
        let scorer = CompositeScorer::new();
        assert_eq!(scorer.score(&signals), scorer.score(&signals));
    }

    #[test]
    fn clamp_score_handles_non_finite() {
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(99.99), 99);
        assert_eq!(clamp_score(250.0), 100);
        assert_eq!(clamp_score(-3.0), 0);
    }
}
