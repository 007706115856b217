//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, window)
//! - Upper: middle + k * stddev(close, window)
//! - Lower: middle - k * stddev(close, window)
//!
//! Population stddev (divide by N). `None` until the window is full.
//! Lookback: window - 1.

use super::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    k: f64,
    band: BollingerBand,
}

impl Bollinger {
    fn with_band(window: usize, k: f64, band: BollingerBand) -> Self {
        assert!(window >= 1, "Bollinger window must be >= 1");
        Self { window, k, band }
    }

    pub fn upper(window: usize, k: f64) -> Self {
        Self::with_band(window, k, BollingerBand::Upper)
    }

    pub fn middle(window: usize, k: f64) -> Self {
        Self::with_band(window, k, BollingerBand::Middle)
    }

    pub fn lower(window: usize, k: f64) -> Self {
        Self::with_band(window, k, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        match self.band {
            BollingerBand::Upper => "boll_upper",
            BollingerBand::Middle => "boll_middle",
            BollingerBand::Lower => "boll_lower",
        }
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.window {
            return result;
        }

        let period = self.window as f64;
        for i in (self.window - 1)..n {
            let window = &bars[i + 1 - self.window..=i];
            let mean = window.iter().map(|b| b.close).sum::<f64>() / period;

            result[i] = Some(match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper | BollingerBand::Lower => {
                    let variance = window
                        .iter()
                        .map(|b| {
                            let diff = b.close - mean;
                            diff * diff
                        })
                        .sum::<f64>()
                        / period;
                    let offset = self.k * variance.sqrt();
                    if self.band == BollingerBand::Upper {
                        mean + offset
                    } else {
                        mean - offset
                    }
                }
            });
        }

        result
    }
}
