//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss) over clipped close deltas.
//! Two smoothing variants, chosen once per deployment via [`RsiSmoothing`]:
//! - `RollingMean`: plain mean of the last `period` gains and losses.
//! - `Wilder`: recursive smoothing with alpha = 1/period, seeded at the
//!   first delta and reported once `period` deltas have been seen.
//!
//! Lookback: period. avg_loss == 0 saturates at 100 unless avg_gain is also
//! 0, in which case the value is undefined.

use super::Indicator;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// How average gain and loss are smoothed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSmoothing {
    #[default]
    RollingMean,
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
}

impl Rsi {
    pub fn new(period: usize, smoothing: RsiSmoothing) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period, smoothing }
    }

    fn rolling_mean(&self, gains: &[f64], losses: &[f64], result: &mut [Option<f64>]) {
        let period = self.period as f64;
        for i in self.period..result.len() {
            let window = i + 1 - self.period..=i;
            let avg_gain = gains[window.clone()].iter().sum::<f64>() / period;
            let avg_loss = losses[window].iter().sum::<f64>() / period;
            result[i] = rsi_value(avg_gain, avg_loss);
        }
    }

    fn wilder(&self, gains: &[f64], losses: &[f64], result: &mut [Option<f64>]) {
        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = gains[1];
        let mut avg_loss = losses[1];
        for i in 1..result.len() {
            if i > 1 {
                avg_gain = alpha * gains[i] + (1.0 - alpha) * avg_gain;
                avg_loss = alpha * losses[i] + (1.0 - alpha) * avg_loss;
            }
            if i >= self.period {
                result[i] = rsi_value(avg_gain, avg_loss);
            }
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];
        if n < self.period + 1 {
            return result;
        }

        // Index 0 has no delta; its slot is never read.
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }

        match self.smoothing {
            RsiSmoothing::RollingMean => self.rolling_mean(&gains, &losses, &mut result),
            RsiSmoothing::Wilder => self.wilder(&gains, &losses, &mut result),
        }
        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            None
        } else {
            Some(100.0)
        }
    } else {
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}
