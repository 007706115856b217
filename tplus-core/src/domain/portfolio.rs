//! PortfolioState: cash plus open positions.

use super::position::Position;
use super::PriceMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate portfolio state.
///
/// Cash and positions only change together through [`PortfolioState::apply_trade`],
/// so the ledger stays double-entry consistent: every trade moves
/// `delta * price` between cash and the position at the transaction price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    positions: BTreeMap<String, Position>,
}

impl PortfolioState {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            positions: BTreeMap::new(),
        }
    }

    /// Open positions keyed by symbol. A symbol is present only while its
    /// quantity is non-zero.
    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Current quantity held in `symbol` (0 when flat).
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.quantity)
    }

    /// Cash plus every position marked at `prices`.
    ///
    /// Symbols missing from `prices` are marked at their average price, so a
    /// partial price set never fails; it just yields a stale valuation.
    pub fn total_value(&self, prices: &PriceMap) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(symbol, pos)| {
                let price = prices.get(symbol).copied().unwrap_or(pos.avg_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    /// Move `delta_quantity` of `symbol` at `price`, paying or receiving the
    /// cash in the same step. Returns the resulting quantity.
    pub fn apply_trade(&mut self, symbol: &str, delta_quantity: f64, price: f64) -> f64 {
        let new_quantity = self.quantity(symbol) + delta_quantity;
        self.adjust_cash(-delta_quantity * price);
        self.update_position(symbol, new_quantity, price);
        new_quantity
    }

    /// Lightweight, serializable view handed to proposal generators.
    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            cash: self.cash,
            positions: self
                .positions
                .iter()
                .map(|(symbol, pos)| {
                    (
                        symbol.clone(),
                        HoldingSummary {
                            quantity: pos.quantity,
                            avg_price: pos.avg_price,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Set a position's quantity and price; exactly zero removes it.
    pub(crate) fn update_position(&mut self, symbol: &str, quantity: f64, price: f64) {
        if quantity == 0.0 {
            self.positions.remove(symbol);
            return;
        }
        self.positions
            .entry(symbol.to_string())
            .and_modify(|pos| {
                pos.quantity = quantity;
                pos.avg_price = price;
            })
            .or_insert_with(|| Position::new(symbol, quantity, price));
    }

    pub(crate) fn adjust_cash(&mut self, delta: f64) {
        self.cash += delta;
    }
}

/// Portfolio view passed to proposal generators and rendered into prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub cash: f64,
    pub positions: BTreeMap<String, HoldingSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub quantity: f64,
    pub avg_price: f64,
}
