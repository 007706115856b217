use serde::{Deserialize, Serialize};

/// Holding in a single symbol. Quantity may be fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>, quantity: f64, avg_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_price,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}
