// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   macd_line   = EMA(fast) - EMA(slow)
//   signal_line = EMA(macd_line, signal)
//   histogram   = macd_line - signal_line
//
// EMAs are seeded with the first value (see `ema`), so all three columns stay
// aligned with the price series.  A value is reported only once `slow` prices
// exist, since earlier points are dominated by the seed.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::ema::ema_series;

/// Latest MACD reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Standard 12 / 26 / 9 periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// Compute the latest MACD reading for `values`.
///
/// Returns `None` when `fast >= slow`, any period is zero, fewer than `slow`
/// values exist, or an intermediate value is non-finite.
pub fn latest_macd(values: &[f64], params: MacdParams) -> Option<MacdReading> {
    let MacdParams { fast, slow, signal } = params;
    if fast == 0 || signal == 0 || fast >= slow || values.len() < slow {
        return None;
    }

    let fast_ema = ema_series(values, fast);
    let slow_ema = ema_series(values, slow);
    if fast_ema.len() != values.len() || slow_ema.len() != values.len() {
        return None;
    }

    let macd_line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema_series(&macd_line, signal);
    if signal_line.len() != macd_line.len() {
        return None;
    }

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;
    Some(MacdReading {
        macd,
        signal,
        histogram: macd - signal,
    })
}
