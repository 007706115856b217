//! Domain types for the T+1 simulator

pub mod bar;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod session;

pub use bar::{Bar, EnrichedBar};
pub use order::{EquitySnapshot, OrderSide, TradeOrder};
pub use portfolio::{HoldingSummary, PortfolioState, PortfolioSummary};
pub use position::Position;
pub use session::MarketSession;

use std::collections::BTreeMap;

/// Symbol type alias
pub type Symbol = String;

/// Price per symbol. Ordered so that valuation sums are reproducible.
pub type PriceMap = BTreeMap<Symbol, f64>;

/// Target portfolio weight per symbol.
pub type TargetWeights = BTreeMap<Symbol, f64>;

/// Raw proposed weight per symbol; any real value, not normalized.
pub type Allocation = BTreeMap<Symbol, f64>;
