//! Proposal generators: one agent's view of what to hold next session.
//!
//! A generator sees the market snapshot, the portfolio and the risk limits
//! and returns raw symbol weights. It never fails: anything it cannot turn
//! into weights becomes an empty allocation.

pub mod momentum;
pub mod snapshot;

pub use momentum::MomentumScorer;
pub use snapshot::{
    BarRecord, BollingerSummary, IndicatorSummary, KdjSummary, MacdSummary, MarketSnapshot,
    SymbolSnapshot, SNAPSHOT_BAR_COUNT, SNAPSHOT_TIME_FORMAT,
};

use crate::allocation::RiskLimits;
use crate::domain::{Allocation, PortfolioSummary};
use chrono::NaiveDate;

/// Inputs for one proposal.
#[derive(Debug, Clone, Copy)]
pub struct ProposalRequest<'a> {
    pub date: NaiveDate,
    pub snapshot: &'a MarketSnapshot,
    pub portfolio: &'a PortfolioSummary,
    pub risk_limits: &'a RiskLimits,
}

/// Capability interface for anything that proposes allocations.
pub trait ProposalGenerator: Send + Sync {
    /// Identifier used in logs and decisions.
    fn name(&self) -> &str;

    fn propose(&self, request: &ProposalRequest<'_>) -> Allocation;
}
