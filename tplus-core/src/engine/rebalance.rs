//! Rebalancing: move the portfolio to target weights at the next session's open.
//!
//! Three steps per date transition:
//! 1. Liquidate held symbols that dropped out of the targets (when priced)
//! 2. Value the portfolio at the open
//! 3. Resize every priced target symbol to `value * weight / open`
//!
//! The day's snapshot is then marked at the session close.

use crate::domain::{EquitySnapshot, MarketSession, PortfolioState, PriceMap, TargetWeights, TradeOrder};
use chrono::NaiveDate;
use tracing::debug;

/// Quantity changes smaller than this are not traded.
pub const MIN_TRADE_QUANTITY: f64 = 1e-6;

/// Orders executed for one date plus the close-marked valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct DayExecution {
    pub orders: Vec<TradeOrder>,
    pub snapshot: EquitySnapshot,
}

/// Rebalance `portfolio` toward `targets` at `open_prices`.
///
/// Liquidations are emitted before any resize. Symbols without a usable
/// open price are neither bought nor sold. Cash sufficiency is not enforced.
pub fn rebalance(
    date: NaiveDate,
    portfolio: &mut PortfolioState,
    targets: &TargetWeights,
    open_prices: &PriceMap,
) -> Vec<TradeOrder> {
    let open_prices = &usable_prices(open_prices);
    let mut orders = Vec::new();

    let dropped: Vec<(String, f64)> = portfolio
        .positions()
        .iter()
        .filter(|(symbol, _)| !targets.contains_key(*symbol))
        .map(|(symbol, pos)| (symbol.clone(), pos.quantity))
        .collect();
    for (symbol, quantity) in dropped {
        let Some(&price) = open_prices.get(&symbol) else {
            debug!(%date, %symbol, "no open price, keeping dropped position");
            continue;
        };
        portfolio.apply_trade(&symbol, -quantity, price);
        let order = TradeOrder::from_delta(date, &symbol, -quantity, price);
        debug!(%date, %symbol, quantity = order.quantity, price, "liquidate");
        orders.push(order);
    }

    let value = portfolio.total_value(open_prices);

    for (symbol, &weight) in targets {
        let Some(&price) = open_prices.get(symbol) else {
            debug!(%date, %symbol, "no open price, skipping target");
            continue;
        };
        let target_quantity = value * weight / price;
        let delta = target_quantity - portfolio.quantity(symbol);
        if delta.abs() < MIN_TRADE_QUANTITY {
            continue;
        }
        portfolio.apply_trade(symbol, delta, price);
        let order = TradeOrder::from_delta(date, symbol, delta, price);
        debug!(%date, %symbol, side = %order.side, quantity = order.quantity, price, "resize");
        orders.push(order);
    }

    orders
}

/// Prices that are finite and positive. Anything else counts as missing.
pub fn usable_prices(prices: &PriceMap) -> PriceMap {
    prices
        .iter()
        .filter(|(_, p)| p.is_finite() && **p > 0.0)
        .map(|(s, p)| (s.clone(), *p))
        .collect()
}

/// Execute one date: rebalance at the session's opens, mark at its closes.
pub fn execute_day(
    portfolio: &mut PortfolioState,
    targets: &TargetWeights,
    session: &MarketSession,
) -> DayExecution {
    let orders = rebalance(session.date, portfolio, targets, &session.open_prices());
    let snapshot = EquitySnapshot {
        date: session.date,
        equity: portfolio.total_value(&usable_prices(&session.close_prices())),
        cash: portfolio.cash,
    };
    DayExecution { orders, snapshot }
}
