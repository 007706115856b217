//! Backtest driver: walks consecutive trading dates and executes T+1.
//!
//! For each pair (D, D+1):
//! 1. Load and enrich D's session
//! 2. Ask the planner for target weights from D's data
//! 3. Load D+1's session
//! 4. Rebalance at D+1's opens, mark at D+1's closes
//!
//! Every fallible load for a pair completes before the portfolio is touched,
//! so a failure leaves the portfolio as the last completed date left it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use tplus_core::data::DataError;
use tplus_core::domain::{EquitySnapshot, PortfolioState, TargetWeights, TradeOrder};
use tplus_core::engine::{execute_day, AllocationPlanner};

use crate::data_loader::MarketFeed;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("at least two distinct trading dates are required, got {0}")]
    InsufficientDates(usize),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// One snapshot per execution date, in date order.
    pub equity_curve: Vec<EquitySnapshot>,
    /// All orders in execution order.
    pub orders: Vec<TradeOrder>,
    /// Planner output keyed by decision date.
    pub target_weights: BTreeMap<NaiveDate, TargetWeights>,
}

impl BacktestResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|s| s.equity).collect()
    }
}

/// Runs a planner over a date range against one market feed.
///
/// The portfolio persists across calls to `run`, so a second call continues
/// from where the first left off.
pub struct Backtester<'a> {
    feed: &'a MarketFeed,
    portfolio: PortfolioState,
}

impl<'a> Backtester<'a> {
    pub fn new(feed: &'a MarketFeed, initial_cash: f64) -> Self {
        Self {
            feed,
            portfolio: PortfolioState::new(initial_cash),
        }
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn run(
        &mut self,
        dates: &[NaiveDate],
        planner: &dyn AllocationPlanner,
    ) -> Result<BacktestResult, BacktestError> {
        let mut ordered = dates.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        if ordered.len() < 2 {
            return Err(BacktestError::InsufficientDates(ordered.len()));
        }

        let mut result = BacktestResult::default();
        for pair in ordered.windows(2) {
            let (decision_date, execution_date) = (pair[0], pair[1]);

            let session = self.feed.load_for_date(decision_date)?;
            let targets = planner.target_weights(&session, &self.portfolio.summary());
            let next = self.feed.load_for_date(execution_date)?;

            let day = execute_day(&mut self.portfolio, &targets, &next);
            info!(
                decision = %decision_date,
                execution = %execution_date,
                targets = targets.len(),
                orders = day.orders.len(),
                equity = day.snapshot.equity,
                cash = day.snapshot.cash,
                "session executed"
            );

            result.target_weights.insert(decision_date, targets);
            result.orders.extend(day.orders);
            result.equity_curve.push(day.snapshot);
        }

        info!(
            sessions = result.equity_curve.len(),
            orders = result.orders.len(),
            "backtest complete"
        );
        Ok(result)
    }
}
