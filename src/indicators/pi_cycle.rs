// =============================================================================
// Pi Cycle Top Indicator
// =============================================================================
//
// Compares a fast 111-period EMA of price against twice the 350-period SMA.
//
//   short   = EMA(price, span = 111), seeded with the first price
//   long    = 2 * SMA(price, window = 350)
//   active  = short > long
//   gap     = (short - long) / long * 100
//   distance = max(0, gap)
//
// Both averages exist only once 350 prices are available, so shorter series
// produce no state at all rather than a partial average.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::ema::{ema_series, latest_ema};
use crate::indicators::sma::{rolling_sma, trailing_sma};
use crate::types::PriceSeries;

/// EMA span of the short-term average.
pub const SHORT_SPAN: usize = 111;
/// SMA window of the long-term average.
pub const LONG_WINDOW: usize = 350;
/// Multiplier applied to the long-term SMA.
pub const LONG_MULTIPLIER: f64 = 2.0;

/// Pi Cycle reading for one point of the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiCycleState {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    /// 111-period EMA.
    pub short_term_average: f64,
    /// 350-period SMA multiplied by 2.
    pub long_term_average: f64,
    pub signal_active: bool,
    /// Percentage gap floored at zero.
    pub distance_value: f64,
    /// Percentage gap before flooring; negative while the EMA is below.
    pub raw_gap: f64,
}

impl PiCycleState {
    fn from_averages(timestamp: DateTime<Utc>, price: f64, short: f64, long: f64) -> Option<Self> {
        if long <= 0.0 {
            return None;
        }
        let raw_gap = (short - long) / long * 100.0;
        if !raw_gap.is_finite() {
            return None;
        }
        Some(Self {
            timestamp,
            price,
            short_term_average: short,
            long_term_average: long,
            signal_active: short > long,
            distance_value: raw_gap.max(0.0),
            raw_gap,
        })
    }
}

/// Pi Cycle state at the most recent point of `series`.
///
/// Returns `None` when the series holds fewer than [`LONG_WINDOW`] points or
/// the averages are not computable.
pub fn latest_pi_cycle(series: &PriceSeries) -> Option<PiCycleState> {
    if series.len() < LONG_WINDOW {
        return None;
    }
    let prices = series.prices();
    let latest = series.latest()?;

    let short = latest_ema(&prices, SHORT_SPAN)?;
    let long = trailing_sma(&prices, LONG_WINDOW)? * LONG_MULTIPLIER;

    PiCycleState::from_averages(latest.timestamp, latest.price, short, long)
}

/// Pi Cycle state for every point where both averages are defined, oldest
/// first.  Empty when the series is shorter than [`LONG_WINDOW`].
pub fn pi_cycle_series(series: &PriceSeries) -> Vec<PiCycleState> {
    if series.len() < LONG_WINDOW {
        return Vec::new();
    }
    let prices = series.prices();
    let ema = ema_series(&prices, SHORT_SPAN);
    let sma = rolling_sma(&prices, LONG_WINDOW);

    series
        .points()
        .iter()
        .zip(ema.iter())
        .zip(sma.iter())
        .filter_map(|((point, &short), sma)| {
            let long = (*sma)? * LONG_MULTIPLIER;
            PiCycleState::from_averages(point.timestamp, point.price, short, long)
        })
        .collect()
}
