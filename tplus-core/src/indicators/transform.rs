//! Indicator configuration and the bar enrichment transform.

use super::{Bollinger, Indicator, IndicatorValues, Kdj, Macd, Rsi, RsiSmoothing};
use crate::domain::{Bar, EnrichedBar};
use serde::{Deserialize, Serialize};

/// Parameters for every indicator group. Defaults are the conventional
/// MACD(12, 26, 9), BOLL(20, 2), RSI(14) and KDJ(9, 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub boll_window: usize,
    pub boll_k: f64,
    pub rsi_period: usize,
    pub rsi_smoothing: RsiSmoothing,
    pub kdj_window: usize,
    pub kdj_smoothing: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            boll_window: 20,
            boll_k: 2.0,
            rsi_period: 14,
            rsi_smoothing: RsiSmoothing::RollingMean,
            kdj_window: 9,
            kdj_smoothing: 3,
        }
    }
}

impl IndicatorConfig {
    /// Names of any period parameters set to zero.
    pub fn zero_periods(&self) -> Vec<&'static str> {
        [
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("boll_window", self.boll_window),
            ("rsi_period", self.rsi_period),
            ("kdj_window", self.kdj_window),
            ("kdj_smoothing", self.kdj_smoothing),
        ]
        .into_iter()
        .filter(|(_, v)| *v == 0)
        .map(|(name, _)| name)
        .collect()
    }
}

/// The full indicator set for one configuration.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSuite {
    config: IndicatorConfig,
}

impl IndicatorSuite {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// One instance per enriched field.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let c = &self.config;
        vec![
            Box::new(Macd::line(c.macd_fast, c.macd_slow, c.macd_signal)),
            Box::new(Macd::signal(c.macd_fast, c.macd_slow, c.macd_signal)),
            Box::new(Macd::histogram(c.macd_fast, c.macd_slow, c.macd_signal)),
            Box::new(Bollinger::upper(c.boll_window, c.boll_k)),
            Box::new(Bollinger::middle(c.boll_window, c.boll_k)),
            Box::new(Bollinger::lower(c.boll_window, c.boll_k)),
            Box::new(Rsi::new(c.rsi_period, c.rsi_smoothing)),
            Box::new(Kdj::k(c.kdj_window, c.kdj_smoothing)),
            Box::new(Kdj::d(c.kdj_window, c.kdj_smoothing)),
            Box::new(Kdj::j(c.kdj_window, c.kdj_smoothing)),
        ]
    }

    /// Longest warm-up across the suite.
    pub fn max_lookback(&self) -> usize {
        self.indicators()
            .iter()
            .map(|ind| ind.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Precompute every indicator over `bars`.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        for indicator in self.indicators() {
            values.insert(indicator.name(), indicator.compute(bars));
        }
        values
    }

    /// Attach every indicator field to its bar.
    pub fn enrich(&self, bars: &[Bar]) -> Vec<EnrichedBar> {
        let values = self.compute(bars);
        bars.iter()
            .enumerate()
            .map(|(i, bar)| EnrichedBar {
                bar: bar.clone(),
                macd: values.get("macd", i),
                macd_signal: values.get("macd_signal", i),
                macd_hist: values.get("macd_hist", i),
                boll_upper: values.get("boll_upper", i),
                boll_middle: values.get("boll_middle", i),
                boll_lower: values.get("boll_lower", i),
                rsi: values.get("rsi", i),
                kdj_k: values.get("kdj_k", i),
                kdj_d: values.get("kdj_d", i),
                kdj_j: values.get("kdj_j", i),
            })
            .collect()
    }
}

/// Enrich `bars` with the default indicator configuration.
pub fn transform(bars: &[Bar]) -> Vec<EnrichedBar> {
    IndicatorSuite::default().enrich(bars)
}
