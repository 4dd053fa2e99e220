// =============================================================================
// Signal Normalizer — raw signals to capped contributions
// =============================================================================
//
// | signal            | rule                                   | cap  |
// |-------------------|----------------------------------------|------|
// | price             | price / 1000                           | 40   |
// | fear & greed      | value * 0.3                            | -    |
// | trend             | value / 2                              | 15   |
// | volume ratio      | > 2 => 15, > 1.5 => 10, else 5         | 15   |
// | dominance         | < 40 => 10, < 45 => 5, else 0          | 10   |
// | pi cycle active   | 15 when active                         | 15   |
// | pi cycle distance | distance > 10 => distance * 0.1        | -    |
// | rsi               | value / 100 * 10                       | 10   |
// | macd              | raw signed value                       | -    |
//
// Absent or non-finite inputs contribute exactly 0.  This is the only place
// presence is checked; the scorer just sums.

use serde::{Deserialize, Serialize};

use crate::signals::snapshot::SignalSet;

pub const PRICE_DIVISOR: f64 = 1000.0;
pub const PRICE_CAP: f64 = 40.0;
pub const FEAR_GREED_WEIGHT: f64 = 0.3;
pub const TREND_DIVISOR: f64 = 2.0;
pub const TREND_CAP: f64 = 15.0;
pub const PI_ACTIVE_POINTS: f64 = 15.0;
pub const PI_DISTANCE_THRESHOLD: f64 = 10.0;
pub const PI_DISTANCE_WEIGHT: f64 = 0.1;
pub const RSI_CAP: f64 = 10.0;

/// Identifies one term of the composite sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Price,
    FearGreed,
    Trend,
    VolumeRatio,
    Dominance,
    PiCycleActive,
    PiCycleDistance,
    Rsi,
    Macd,
}

impl SignalKind {
    pub const ALL: [SignalKind; 9] = [
        Self::Price,
        Self::FearGreed,
        Self::Trend,
        Self::VolumeRatio,
        Self::Dominance,
        Self::PiCycleActive,
        Self::PiCycleDistance,
        Self::Rsi,
        Self::Macd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::FearGreed => "fear_greed",
            Self::Trend => "trend",
            Self::VolumeRatio => "volume_ratio",
            Self::Dominance => "dominance",
            Self::PiCycleActive => "pi_cycle_active",
            Self::PiCycleDistance => "pi_cycle_distance",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
        }
    }
}

/// The contribution of a single signal to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub signal: SignalKind,
    /// Raw input, when present.
    pub raw: Option<f64>,
    pub contribution: f64,
}

/// `Some(v)` only for finite values.
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

pub fn price_points(price: Option<f64>) -> f64 {
    finite(price).map_or(0.0, |p| (p / PRICE_DIVISOR).min(PRICE_CAP))
}

pub fn fear_greed_points(index: Option<f64>) -> f64 {
    finite(index).map_or(0.0, |v| v * FEAR_GREED_WEIGHT)
}

pub fn trend_points(score: Option<f64>) -> f64 {
    finite(score).map_or(0.0, |v| (v / TREND_DIVISOR).min(TREND_CAP))
}

pub fn volume_points(ratio: Option<f64>) -> f64 {
    match finite(ratio) {
        Some(r) if r > 2.0 => 15.0,
        Some(r) if r > 1.5 => 10.0,
        Some(_) => 5.0,
        None => 0.0,
    }
}

pub fn dominance_points(dominance: Option<f64>) -> f64 {
    match finite(dominance) {
        Some(d) if d < 40.0 => 10.0,
        Some(d) if d < 45.0 => 5.0,
        _ => 0.0,
    }
}

pub fn pi_active_points(active: Option<bool>) -> f64 {
    if active == Some(true) {
        PI_ACTIVE_POINTS
    } else {
        0.0
    }
}

pub fn pi_distance_points(distance: Option<f64>) -> f64 {
    match finite(distance) {
        Some(d) if d > PI_DISTANCE_THRESHOLD => d * PI_DISTANCE_WEIGHT,
        _ => 0.0,
    }
}

pub fn rsi_points(rsi: Option<f64>) -> f64 {
    finite(rsi).map_or(0.0, |v| (v / 100.0 * 10.0).min(RSI_CAP))
}

pub fn macd_points(macd: Option<f64>) -> f64 {
    finite(macd).unwrap_or(0.0)
}

/// Normalize every signal in `signals`, one entry per [`SignalKind`] in
/// declaration order.
pub fn normalize(signals: &SignalSet) -> Vec<SignalContribution> {
    let pi_active = signals.pi_cycle.as_ref().map(|p| p.signal_active);
    let pi_distance = signals.pi_cycle.as_ref().map(|p| p.distance_value);

    SignalKind::ALL
        .iter()
        .map(|&signal| {
            let (raw, contribution) = match signal {
                SignalKind::Price => (signals.price, price_points(signals.price)),
                SignalKind::FearGreed => (
                    signals.fear_greed_index,
                    fear_greed_points(signals.fear_greed_index),
                ),
                SignalKind::Trend => (signals.trend_score, trend_points(signals.trend_score)),
                SignalKind::VolumeRatio => {
                    (signals.volume_ratio, volume_points(signals.volume_ratio))
                }
                SignalKind::Dominance => (
                    signals.dominance_percent,
                    dominance_points(signals.dominance_percent),
                ),
                SignalKind::PiCycleActive => (
                    pi_active.map(|a| if a { 1.0 } else { 0.0 }),
                    pi_active_points(pi_active),
                ),
                SignalKind::PiCycleDistance => (pi_distance, pi_distance_points(pi_distance)),
                SignalKind::Rsi => (signals.rsi, rsi_points(signals.rsi)),
                SignalKind::Macd => (signals.macd_average, macd_points(signals.macd_average)),
            };
            SignalContribution {
                signal,
                raw: finite(raw),
                contribution,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_signals_contribute_zero() {
        let all = normalize(&SignalSet::default());
        assert_eq!(all.len(), SignalKind::ALL.len());
        assert!(all.iter().all(|c| c.contribution == 0.0 && c.raw.is_none()));
    }

    #[test]
    fn non_finite_treated_as_absent() {
        assert_eq!(price_points(Some(f64::NAN)), 0.0);
        assert_eq!(macd_points(Some(f64::INFINITY)), 0.0);
        assert_eq!(volume_points(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn price_is_capped() {
        assert!((price_points(Some(30_000.0)) - 30.0).abs() < 1e-12);
        assert_eq!(price_points(Some(100_000.0)), PRICE_CAP);
    }

    #[test]
    fn trend_is_capped() {
        assert!((trend_points(Some(20.0)) - 10.0).abs() < 1e-12);
        assert_eq!(trend_points(Some(50.0)), TREND_CAP);
    }

    #[test]
    fn volume_buckets() {
        assert_eq!(volume_points(Some(2.5)), 15.0);
        assert_eq!(volume_points(Some(2.0)), 10.0);
        assert_eq!(volume_points(Some(1.6)), 10.0);
        assert_eq!(volume_points(Some(1.5)), 5.0);
        assert_eq!(volume_points(Some(0.2)), 5.0);
        assert_eq!(volume_points(None), 0.0);
    }

    #[test]
    fn dominance_buckets() {
        assert_eq!(dominance_points(Some(38.0)), 10.0);
        assert_eq!(dominance_points(Some(40.0)), 5.0);
        assert_eq!(dominance_points(Some(44.9)), 5.0);
        assert_eq!(dominance_points(Some(45.0)), 0.0);
        assert_eq!(dominance_points(None), 0.0);
    }

    #[test]
    fn pi_distance_threshold() {
        assert_eq!(pi_distance_points(Some(10.0)), 0.0);
        assert!((pi_distance_points(Some(12.0)) - 1.2).abs() < 1e-12);
        assert_eq!(pi_active_points(Some(false)), 0.0);
        assert_eq!(pi_active_points(Some(true)), 15.0);
        assert_eq!(pi_active_points(None), 0.0);
    }

    #[test]
    fn rsi_scaled_and_capped() {
        assert!((rsi_points(Some(70.0)) - 7.0).abs() < 1e-12);
        assert_eq!(rsi_points(Some(150.0)), RSI_CAP);
    }

    #[test]
    fn macd_passes_through_signed() {
        assert_eq!(macd_points(Some(-3.5)), -3.5);
        assert_eq!(macd_points(Some(2.0)), 2.0);
    }

    #[test]
    fn fear_greed_uncapped() {
        assert!((fear_greed_points(Some(75.0)) - 22.5).abs() < 1e-12);
        assert!((fear_greed_points(Some(100.0)) - 30.0).abs() < 1e-12);
    }
}
