//! Executed order records and equity snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side implied by a signed quantity change.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed order. Append-only: never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: OrderSide,
    /// Always non-negative; direction lives in `side`.
    pub quantity: f64,
    pub price: f64,
    /// `quantity * price`, non-negative.
    pub notional: f64,
}

impl TradeOrder {
    /// Build an order from a signed quantity change executed at `price`.
    pub fn from_delta(date: NaiveDate, symbol: impl Into<String>, delta: f64, price: f64) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            side: OrderSide::from_delta(delta),
            quantity: delta.abs(),
            price,
            notional: (delta * price).abs(),
        }
    }

    /// Signed quantity change (positive for buys).
    pub fn signed_quantity(&self) -> f64 {
        match self.side {
            OrderSide::Buy => self.quantity,
            OrderSide::Sell => -self.quantity,
        }
    }
}

/// Portfolio valuation recorded once per execution date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
}
