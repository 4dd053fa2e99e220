// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / loss with the mean of the first `period` deltas.
// Step 3 — Wilder smoothing for every later delta:
//            avg = (prev_avg * (period - 1) + current) / period
// Step 4 — RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS)
// =============================================================================

/// Default look-back used by the scorer.
pub const DEFAULT_PERIOD: usize = 14;

/// Most recent RSI value in [0, 100].
///
/// Returns `None` when `period == 0`, when fewer than `period + 1` values are
/// supplied, or when the smoothing produces a non-finite value.
pub fn latest_rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let mut deltas = values.windows(2).map(|w| w[1] - w[0]);
    let period_f = period as f64;

    let (mut avg_gain, mut avg_loss) = deltas
        .by_ref()
        .take(period)
        .fold((0.0_f64, 0.0_f64), |(g, l), d| (g + d.max(0.0), l + (-d).max(0.0)));
    avg_gain /= period_f;
    avg_loss /= period_f;

    for d in deltas {
        avg_gain = (avg_gain * (period_f - 1.0) + d.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-d).max(0.0)) / period_f;
        if !avg_gain.is_finite() || !avg_loss.is_finite() {
            return None;
        }
    }

    rsi_from_averages(avg_gain, avg_loss)
}

/// No movement reads as 50; only gains reads as 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };
    rsi.is_finite().then_some(rsi)
}
