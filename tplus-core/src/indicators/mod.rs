//! Technical indicators and the enrichment transform.
//!
//! Every indicator implements [`Indicator`]: a full bar series in, one
//! optional value per bar out. Multi-line indicators (MACD, Bollinger, KDJ)
//! are exposed as separate instances per line, keeping the trait single-series.
//! [`IndicatorSuite`] runs the configured set and folds the results into
//! [`EnrichedBar`](crate::domain::EnrichedBar)s.

pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod transform;

pub use bollinger::{Bollinger, BollingerBand};
pub use ema::ema_of_series;
pub use kdj::{Kdj, KdjLine};
pub use macd::{Macd, MacdLine};
pub use rsi::{Rsi, RsiSmoothing};
pub use transform::{transform, IndicatorConfig, IndicatorSuite};

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// `compute` returns a series the same length as `bars`. Warm-up positions
/// and undefined values (e.g. a zero denominator) are `None`.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bars after t. Every indicator must pass
/// the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Name under which the series is stored; matches the enriched field.
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator can produce a value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Precomputed indicator series keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<Option<f64>>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(name.into(), values);
    }

    /// Value of `name` at `bar_index`; `None` when missing, out of range, or undefined.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied().flatten())
    }
}

/// Create synthetic five-minute bars from close prices for testing.
///
/// open = prev close (or close for the first bar), high/low = max/min ± 1.0,
/// volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 35, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                amount: close * 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
