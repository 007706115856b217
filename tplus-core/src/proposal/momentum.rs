//! Rule-based proposal: equal-weight the best momentum scores.
//!
//! score = macd_hist + kdj_j / 100 - (rsi - 50) / 100
//!
//! Undefined readings count as neutral (hist 0, J 0, RSI 50).

use super::{IndicatorSummary, ProposalGenerator, ProposalRequest};
use crate::domain::Allocation;

/// Default number of symbols held.
pub const DEFAULT_TOP_N: usize = 4;

#[derive(Debug, Clone)]
pub struct MomentumScorer {
    name: String,
    top_n: usize,
}

impl Default for MomentumScorer {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl MomentumScorer {
    pub fn new(top_n: usize) -> Self {
        Self {
            name: "momentum".to_string(),
            top_n,
        }
    }

    pub fn score(indicators: &IndicatorSummary) -> f64 {
        let hist = indicators.macd.hist.unwrap_or(0.0);
        let j = indicators.kdj.j.unwrap_or(0.0);
        let rsi = indicators.rsi.unwrap_or(50.0);
        hist + j / 100.0 - (rsi - 50.0) / 100.0
    }
}

impl ProposalGenerator for MomentumScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose(&self, request: &ProposalRequest<'_>) -> Allocation {
        let mut scored: Vec<(&String, f64)> = request
            .snapshot
            .symbols
            .iter()
            .map(|(symbol, snap)| (symbol, Self::score(&snap.indicators)))
            .collect();
        // Stable sort keeps symbol order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.top_n);

        if scored.is_empty() {
            return Allocation::new();
        }
        let weight = 1.0 / scored.len() as f64;
        scored
            .into_iter()
            .map(|(symbol, _)| (symbol.clone(), weight))
            .collect()
    }
}
