// =============================================================================
// Signal Snapshot — one typed, optional field per input signal
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::PiCycleState;

/// Raw values for one evaluation.  `None` means the source was unavailable or
/// the indicator had insufficient data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    /// Spot price in USD.
    pub price: Option<f64>,
    /// Fear & Greed index in [0, 100].
    pub fear_greed_index: Option<f64>,
    /// Provider's label for the index; informational only.
    pub fear_greed_label: Option<String>,
    /// Search-interest trend score, roughly [0, 100].
    pub trend_score: Option<f64>,
    /// Latest 24h volume divided by its 7-day average.
    pub volume_ratio: Option<f64>,
    /// Share of total crypto market cap, percent.
    pub dominance_percent: Option<f64>,
    pub rsi: Option<f64>,
    /// MACD signal-line value (EMA of the MACD line).  Left `None` unless
    /// `include_macd` is set; reports list it under `disabled_signals`.
    pub macd_average: Option<f64>,
    pub pi_cycle: Option<PiCycleState>,
}

impl SignalSet {
    /// Number of signals carrying a value.
    pub fn present_count(&self) -> usize {
        [
            self.price.is_some(),
            self.fear_greed_index.is_some(),
            self.trend_score.is_some(),
            self.volume_ratio.is_some(),
            self.dominance_percent.is_some(),
            self.rsi.is_some(),
            self.macd_average.is_some(),
            self.pi_cycle.is_some(),
        ]
        .iter()
        .filter(|&&p| p)
        .count()
    }
}
