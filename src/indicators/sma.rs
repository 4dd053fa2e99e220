// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Rolling arithmetic mean over a trailing window.  Positions before the window
// is full have no value; `rolling_sma` returns `None` there so the output
// stays index-aligned with its input.
// =============================================================================

/// Rolling SMA aligned with `values`: `None` for the first `window - 1`
/// positions.
///
/// Uses a running sum, so each step is O(1).  Returns an all-`None` vector
/// when `window == 0`.
pub fn rolling_sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let w = window as f64;
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / w);

    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / w);
    }

    out
}

/// Mean of the trailing `window` values.
///
/// Returns `None` when there are fewer than `window` values, `window == 0`, or
/// the mean is non-finite.  Computed directly from the slice so it carries no
/// running-sum drift.
pub fn trailing_sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    let mean = tail.iter().sum::<f64>() / window as f64;
    mean.is_finite().then_some(mean)
}
