//! Performance analytics: pure functions over a finished equity curve.
//!
//! Annualization assumes 252 trading sessions per year.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tplus_core::domain::EquitySnapshot;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Peak and trough dates of the deepest drawdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Headline statistics for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Deepest decline as a negative fraction, 0 when there is none.
    pub max_drawdown: f64,
    pub max_drawdown_window: DrawdownWindow,
}

impl PerformanceSummary {
    /// All-zero summary for an empty curve.
    pub fn compute(curve: &[EquitySnapshot]) -> Self {
        if curve.is_empty() {
            return Self::default();
        }
        let equity: Vec<f64> = curve.iter().map(|s| s.equity).collect();
        let returns = daily_returns(&equity);
        let total = total_return(&equity);
        let vol = volatility(&returns);
        let (dd, peak, trough) = max_drawdown(&equity);

        Self {
            total_return: total,
            annualized_return: annualized_return(total, returns.len()),
            volatility: vol,
            sharpe_ratio: sharpe_ratio(&returns),
            max_drawdown: dd,
            max_drawdown_window: DrawdownWindow {
                start: peak.map(|i| curve[i].date),
                end: trough.map(|i| curve[i].date),
            },
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Percentage change per observation; the first observation is 0.
pub fn daily_returns(equity: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(equity.len());
    if equity.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(equity.windows(2).map(|w| {
        if w[0] != 0.0 {
            w[1] / w[0] - 1.0
        } else {
            0.0
        }
    }));
    returns
}

/// last / first - 1; 0 for an empty curve or a zero start.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Compound `total` over `observations` sessions to a yearly rate.
pub fn annualized_return(total: f64, observations: usize) -> f64 {
    if observations <= 1 {
        return total;
    }
    (1.0 + total).powf(TRADING_DAYS_PER_YEAR / observations as f64) - 1.0
}

/// Population standard deviation of returns, annualized.
pub fn volatility(returns: &[f64]) -> f64 {
    population_std(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized mean over annualized volatility; 0 for a flat curve.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let vol = volatility(returns);
    if vol > 0.0 {
        mean(returns) * TRADING_DAYS_PER_YEAR / vol
    } else {
        0.0
    }
}

/// Deepest `equity / running_max - 1`, with the index of the running peak
/// before it and the index of the trough (first occurrences).
pub fn max_drawdown(equity: &[f64]) -> (f64, Option<usize>, Option<usize>) {
    if equity.is_empty() {
        return (0.0, None, None);
    }
    let mut peak_idx = 0;
    let mut worst = (0.0_f64, 0, 0);
    for (i, &eq) in equity.iter().enumerate() {
        if eq > equity[peak_idx] {
            peak_idx = i;
        }
        let peak = equity[peak_idx];
        let dd = if peak > 0.0 { eq / peak - 1.0 } else { 0.0 };
        if dd < worst.0 {
            worst = (dd, peak_idx, i);
        }
    }
    (worst.0, Some(worst.1), Some(worst.2))
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(values: &[f64]) -> Vec<EquitySnapshot> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquitySnapshot {
                date: start + chrono::Duration::days(i as i64),
                equity,
                cash: 0.0,
            })
            .collect()
    }

    #[test]
    fn empty_curve_is_all_zero() {
        let summary = PerformanceSummary::compute(&[]);
        assert_eq!(summary, PerformanceSummary::default());
        assert!(summary.max_drawdown_window.start.is_none());
        assert!(summary.max_drawdown_window.end.is_none());
    }

    #[test]
    fn daily_returns_start_at_zero() {
        let returns = daily_returns(&[1_000_000.0, 1_010_000.0, 1_020_000.0]);
        assert_eq!(returns.len(), 3);
        assert_eq!(returns[0], 0.0);
        assert!((returns[1] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn drawdown_window() {
        let (dd, peak, trough) = max_drawdown(&[100.0, 110.0, 90.0, 95.0, 120.0]);
        assert!((dd - (90.0 / 110.0 - 1.0)).abs() < 1e-12);
        assert!((dd + 0.1818).abs() < 1e-4);
        assert_eq!(peak, Some(1));
        assert_eq!(trough, Some(2));
    }

    #[test]
    fn monotonic_curve_has_no_drawdown() {
        let summary = PerformanceSummary::compute(&curve(&[100.0, 101.0, 102.0]));
        assert_eq!(summary.max_drawdown, 0.0);
        // No decline: the window collapses onto the first observation.
        assert_eq!(summary.max_drawdown_window.start, summary.max_drawdown_window.end);
    }

    #[test]
    fn summary_matches_hand_computation() {
        let values = [1_000_000.0, 1_010_000.0, 1_020_000.0, 980_000.0, 1_050_000.0];
        let summary = PerformanceSummary::compute(&curve(&values));

        assert!((summary.total_return - 0.05).abs() < 1e-12);
        let expected_annual = 1.05_f64.powf(252.0 / 5.0) - 1.0;
        assert!((summary.annualized_return - expected_annual).abs() < 1e-9);

        let returns = daily_returns(&values);
        let m = returns.iter().sum::<f64>() / 5.0;
        let var = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 5.0;
        let vol = var.sqrt() * 252.0_f64.sqrt();
        assert!((summary.volatility - vol).abs() < 1e-12);
        assert!((summary.sharpe_ratio - m * 252.0 / vol).abs() < 1e-9);

        assert!(summary.max_drawdown < 0.0);
        assert_eq!(
            summary.max_drawdown_window.start,
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(
            summary.max_drawdown_window.end,
            NaiveDate::from_ymd_opt(2024, 1, 4)
        );
    }

    #[test]
    fn single_observation() {
        let summary = PerformanceSummary::compute(&curve(&[100.0]));
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.annualized_return, 0.0);
        assert_eq!(summary.volatility, 0.0);
        assert_eq!(summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        let summary = PerformanceSummary::compute(&curve(&[100.0, 100.0, 100.0]));
        assert_eq!(summary.volatility, 0.0);
        assert_eq!(summary.sharpe_ratio, 0.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_equity() -> impl Strategy<Value = Vec<f64>> {
            prop::collection::vec(1_000.0..2_000_000.0_f64, 1..60)
        }

        proptest! {
            #[test]
            fn drawdown_is_a_loss_fraction(equity in arb_equity()) {
                let (dd, peak, trough) = max_drawdown(&equity);
                prop_assert!(dd <= 0.0 && dd > -1.0);
                let (peak, trough) = (peak.unwrap(), trough.unwrap());
                prop_assert!(peak <= trough);
                if dd < 0.0 {
                    let expected = equity[trough] / equity[peak] - 1.0;
                    prop_assert!((dd - expected).abs() < 1e-12);
                }
            }

            #[test]
            fn window_dates_are_ordered(equity in arb_equity()) {
                let summary = PerformanceSummary::compute(&curve(&equity));
                let window = summary.max_drawdown_window;
                prop_assert!(window.start.unwrap() <= window.end.unwrap());
                prop_assert!(summary.volatility >= 0.0);
            }

            #[test]
            fn returns_have_one_entry_per_observation(equity in arb_equity()) {
                let returns = daily_returns(&equity);
                prop_assert_eq!(returns.len(), equity.len());
                prop_assert_eq!(returns[0], 0.0);
            }
        }
    }
}
