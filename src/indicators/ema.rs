// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices than a simple average does.
//
// Formula (span-based smoothing, no bias adjustment):
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0
//   EMA_t  = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// Seeding with the first observation means the output has one value per
// input, so it lines up index-for-index with the price column it came from.
// =============================================================================

/// Smoothing factor for a span-based EMA.
///
/// Returns `None` for `span == 0`.
pub fn smoothing_factor(span: usize) -> Option<f64> {
    if span == 0 {
        return None;
    }
    Some(2.0 / (span as f64 + 1.0))
}

/// Compute the EMA series for `values` with the given `span`.
///
/// The output has the same length as the input.
///
/// # Edge cases
/// - `span == 0` or empty input => empty vec
/// - A non-finite intermediate value truncates the series at that point;
///   consumers should not trust anything computed after it.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = match smoothing_factor(span) {
        Some(a) => a,
        None => return Vec::new(),
    };
    let first = match values.first() {
        Some(&v) if v.is_finite() => v,
        _ => return Vec::new(),
    };

    let mut result = Vec::with_capacity(values.len());
    result.push(first);

    let mut prev = first;
    for &value in &values[1..] {
        let ema = alpha * value + (1.0 - alpha) * prev;
        if !ema.is_finite() {
            break;
        }
        result.push(ema);
        prev = ema;
    }

    result
}

/// Latest EMA value, or `None` if the series could not be computed over the
/// whole input.
pub fn latest_ema(values: &[f64], span: usize) -> Option<f64> {
    let series = ema_series(values, span);
    if series.len() != values.len() {
        return None;
    }
    series.last().copied()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- ema_series ------------------------------------------------------

    #[test]
    fn ema_empty_input() {
        assert!(ema_series(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert!(ema_series(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let ema = ema_series(&[10.0, 20.0, 30.0], 3);
        assert_eq!(ema.len(), 3);
        assert!((ema[0] - 10.0).abs() < 1e-12);
        // alpha = 0.5
        assert!((ema[1] - 15.0).abs() < 1e-12);
        assert!((ema[2] - 22.5).abs() < 1e-12);
    }

    #[test]
    fn ema_matches_recurrence_for_span_111() {
        let values: Vec<f64> = (1..=50).map(|x| (x as f64).sqrt() * 100.0).collect();
        let ema = ema_series(&values, 111);
        let alpha = 2.0 / 112.0;
        let mut expected = values[0];
        for (i, &v) in values.iter().enumerate().skip(1) {
            expected = alpha * v + (1.0 - alpha) * expected;
            assert!((ema[i] - expected).abs() < 1e-9, "index {i}");
        }
    }

    #[test]
    fn ema_constant_input_is_constant() {
        let ema = ema_series(&[42.0; 20], 7);
        assert!(ema.iter().all(|v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn ema_truncates_on_nan() {
        let ema = ema_series(&[1.0, 2.0, f64::NAN, 4.0], 3);
        assert_eq!(ema.len(), 2);
        assert!(latest_ema(&[1.0, 2.0, f64::NAN, 4.0], 3).is_none());
    }

    #[test]
    fn latest_ema_returns_last_value() {
        let v = latest_ema(&[10.0, 20.0, 30.0], 3).unwrap();
        assert!((v - 22.5).abs() < 1e-12);
    }
}
