//! Bar: the fundamental market data unit, and its indicator-enriched form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One intraday OHLCV bar for a single symbol.
///
/// Series of bars are ordered by strictly increasing `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

impl Bar {
    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// A bar plus the indicator columns computed over its series.
///
/// Every indicator value is `None` during its warm-up window and wherever the
/// computation is undefined (zero range, zero average loss with zero gain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_middle: Option<f64>,
    pub boll_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub kdj_k: Option<f64>,
    pub kdj_d: Option<f64>,
    pub kdj_j: Option<f64>,
}

impl EnrichedBar {
    /// A bar with every indicator column undefined.
    pub fn bare(bar: Bar) -> Self {
        Self {
            bar,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            boll_upper: None,
            boll_middle: None,
            boll_lower: None,
            rsi: None,
            kdj_k: None,
            kdj_d: None,
            kdj_j: None,
        }
    }
}
