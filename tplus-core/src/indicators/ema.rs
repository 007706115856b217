//! Exponential moving average, recursive form.
//!
//! ema[0] = x[0]
//! ema[i] = alpha * x[i] + (1 - alpha) * ema[i-1],  alpha = 2 / (span + 1)
//!
//! No SMA seed and no warm-up: the series is defined from the first value.

/// EMA of an arbitrary series. Used by MACD for both price and MACD-line inputs.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    smooth(values, alpha)
}

/// Recursive smoothing with an explicit factor, seeded at the first value.
pub(crate) fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        result.push(next);
        prev = Some(next);
    }
    result
}
