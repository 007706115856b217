//! T+1 execution engine.
//!
//! A decision made on date D from D's enriched session is executed at D+1's
//! open and marked at D+1's close. The planner decides; the engine only
//! rebalances.

pub mod rebalance;

pub use rebalance::{execute_day, rebalance, usable_prices, DayExecution, MIN_TRADE_QUANTITY};

use crate::domain::{MarketSession, PortfolioSummary, TargetWeights};

/// Produces the target weights to execute at the next session.
///
/// Planners never fail: a planner that cannot decide returns empty weights,
/// which liquidates every priced holding into cash.
pub trait AllocationPlanner: Send + Sync {
    fn target_weights(&self, session: &MarketSession, portfolio: &PortfolioSummary) -> TargetWeights;
}

/// Planner that requests the same weights every date.
#[derive(Debug, Clone, Default)]
pub struct FixedPlanner {
    weights: TargetWeights,
}

impl FixedPlanner {
    pub fn new(weights: TargetWeights) -> Self {
        Self { weights }
    }
}

impl AllocationPlanner for FixedPlanner {
    fn target_weights(&self, _session: &MarketSession, _portfolio: &PortfolioSummary) -> TargetWeights {
        self.weights.clone()
    }
}
