//! KDJ stochastic oscillator.
//!
//! RSV = (close - lowest_low(window)) / (highest_high(window) - lowest_low(window)) * 100
//! K = recursive smoothing of RSV, factor 1/smoothing, seeded at the first RSV
//! D = same smoothing of K
//! J = 3K - 2D
//!
//! A flat window (high == low) leaves RSV undefined: K, D and J are `None`
//! at that bar and the smoothing state carries to the next defined RSV.
//! Lookback: window - 1.

use super::Indicator;
use crate::domain::Bar;

/// Which KDJ line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdjLine {
    K,
    D,
    J,
}

#[derive(Debug, Clone)]
pub struct Kdj {
    window: usize,
    smoothing: usize,
    line: KdjLine,
}

impl Kdj {
    fn with_line(window: usize, smoothing: usize, line: KdjLine) -> Self {
        assert!(window >= 1, "KDJ window must be >= 1");
        assert!(smoothing >= 1, "KDJ smoothing must be >= 1");
        Self {
            window,
            smoothing,
            line,
        }
    }

    pub fn k(window: usize, smoothing: usize) -> Self {
        Self::with_line(window, smoothing, KdjLine::K)
    }

    pub fn d(window: usize, smoothing: usize) -> Self {
        Self::with_line(window, smoothing, KdjLine::D)
    }

    pub fn j(window: usize, smoothing: usize) -> Self {
        Self::with_line(window, smoothing, KdjLine::J)
    }

    fn rsv(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut rsv = vec![None; n];
        if n < self.window {
            return rsv;
        }
        for i in (self.window - 1)..n {
            let window = &bars[i + 1 - self.window..=i];
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let highest = window
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range != 0.0 {
                rsv[i] = Some((bars[i].close - lowest) / range * 100.0);
            }
        }
        rsv
    }
}

/// Smooth an optional series; undefined inputs yield undefined outputs
/// without touching the running state.
fn smooth_optional(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|value| {
            let x = (*value)?;
            let next = match state {
                None => x,
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}

impl Indicator for Kdj {
    fn name(&self) -> &str {
        match self.line {
            KdjLine::K => "kdj_k",
            KdjLine::D => "kdj_d",
            KdjLine::J => "kdj_j",
        }
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let alpha = 1.0 / self.smoothing as f64;
        let k = smooth_optional(&self.rsv(bars), alpha);
        if self.line == KdjLine::K {
            return k;
        }
        let d = smooth_optional(&k, alpha);
        match self.line {
            KdjLine::D => d,
            _ => k
                .iter()
                .zip(&d)
                .map(|(k, d)| Some(3.0 * (*k)? - 2.0 * (*d)?))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn flat_bar(bar: &mut Bar, price: f64) {
        bar.open = price;
        bar.high = price;
        bar.low = price;
        bar.close = price;
    }

    #[test]
    fn warmup_is_none() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let k = Kdj::k(3, 3).compute(&bars);
        assert_eq!(k[0], None);
        assert_eq!(k[1], None);
        assert!(k[2].is_some());
    }

    #[test]
    fn first_k_equals_rsv() {
        // make_bars: highs/lows are max/min(open, close) +/- 1
        // window 0..=2 over closes 10, 11, 12: low 9, high 13 -> rsv = 3/4 * 100
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let k = Kdj::k(3, 3).compute(&bars);
        let d = Kdj::d(3, 3).compute(&bars);
        let j = Kdj::j(3, 3).compute(&bars);
        assert_approx(k[2].unwrap(), 75.0, DEFAULT_EPSILON);
        assert_approx(d[2].unwrap(), 75.0, DEFAULT_EPSILON);
        assert_approx(j[2].unwrap(), 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn recursive_smoothing_one_third() {
        // window bars 1..=3: low 9, high 13, close 11 -> rsv = 2/4 * 100
        let bars = make_bars(&[10.0, 11.0, 12.0, 11.0]);
        let k = Kdj::k(3, 3).compute(&bars);
        let d = Kdj::d(3, 3).compute(&bars);
        let j = Kdj::j(3, 3).compute(&bars);
        let k3 = 75.0 * 2.0 / 3.0 + 50.0 / 3.0;
        let d3 = 75.0 * 2.0 / 3.0 + k3 / 3.0;
        assert_approx(k[3].unwrap(), k3, DEFAULT_EPSILON);
        assert_approx(d[3].unwrap(), d3, DEFAULT_EPSILON);
        assert_approx(j[3].unwrap(), 3.0 * k3 - 2.0 * d3, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_window_is_undefined_and_state_carries() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 12.0, 12.0, 12.0, 13.0]);
        for bar in &mut bars[2..6] {
            flat_bar(bar, 12.0);
        }
        let k = Kdj::k(3, 3).compute(&bars);
        let j = Kdj::j(3, 3).compute(&bars);
        // bars 4 and 5 see only flat bars; bar 3 still reaches bar 1's low
        let k3 = k[3].unwrap();
        assert_eq!(k[4], None);
        assert_eq!(k[5], None);
        assert_eq!(j[5], None);
        // bar 6 window: bars 4, 5 flat at 12, bar 6 open 12 close 13, high 14 low 11
        let rsv6 = (13.0 - 11.0) / (14.0 - 11.0) * 100.0;
        assert_approx(k[6].unwrap(), rsv6 / 3.0 + k3 * 2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn k_and_d_bounded() {
        let bars = make_bars(&[10.0, 12.0, 9.0, 14.0, 8.0, 15.0, 11.0, 13.0, 10.0, 16.0]);
        for line in [Kdj::k(9, 3), Kdj::d(9, 3)] {
            for v in line.compute(&bars).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }

    #[test]
    fn lookback() {
        assert_eq!(Kdj::k(9, 3).lookback(), 8);
    }
}
