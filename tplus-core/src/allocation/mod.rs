//! Ensemble aggregation of agent allocation proposals.
//!
//! Each agent proposes raw symbol weights; the aggregator averages them per
//! symbol, keeps the positive ones, normalizes to 1, clips to the
//! per-position cap and finally scales down to the gross-exposure cap.
//!
//! Symbols are accumulated in sorted order and agents in the order given, so
//! identical inputs always yield bit-identical weights.

use crate::domain::{Allocation, TargetWeights};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Position and exposure caps applied to every aggregated allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Largest weight any single symbol may carry.
    pub max_position_pct: f64,
    /// Largest total weight across all symbols.
    pub max_gross_exposure: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: 0.2,
            max_gross_exposure: 1.0,
        }
    }
}

impl RiskLimits {
    pub fn new(max_position_pct: f64, max_gross_exposure: f64) -> Self {
        Self {
            max_position_pct,
            max_gross_exposure,
        }
    }
}

/// One agent's proposal for one trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDecision {
    pub agent: String,
    /// Multiplier applied to every weight this agent proposes.
    pub weight: f64,
    pub allocations: Allocation,
}

impl AgentDecision {
    pub fn new(agent: impl Into<String>, weight: f64, allocations: Allocation) -> Self {
        Self {
            agent: agent.into(),
            weight,
            allocations,
        }
    }
}

/// Combine agent decisions into one target-weight vector.
///
/// Returns an empty map when there are no decisions or no symbol ends up
/// with a positive average weight. Non-finite proposals are ignored.
pub fn aggregate(decisions: &[AgentDecision], limits: &RiskLimits) -> TargetWeights {
    let mut contributions: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for decision in decisions {
        for (symbol, &proposed) in &decision.allocations {
            let scaled = proposed * decision.weight;
            if !scaled.is_finite() {
                debug!(agent = %decision.agent, %symbol, proposed, "ignoring non-finite weight");
                continue;
            }
            contributions.entry(symbol.as_str()).or_default().push(scaled);
        }
    }

    let positive: Vec<(&str, f64)> = contributions
        .into_iter()
        .map(|(symbol, values)| (symbol, values.iter().sum::<f64>() / values.len() as f64))
        .filter(|(_, mean)| *mean > 0.0)
        .collect();

    let total: f64 = positive.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return TargetWeights::new();
    }

    let clipped: TargetWeights = positive
        .into_iter()
        .map(|(symbol, w)| (symbol.to_string(), (w / total).min(limits.max_position_pct)))
        .collect();

    apply_gross_cap(clipped, limits.max_gross_exposure)
}

/// Scale `weights` down proportionally when their sum exceeds `cap`.
pub fn apply_gross_cap(weights: TargetWeights, cap: f64) -> TargetWeights {
    let gross: f64 = weights.values().sum();
    if gross <= cap {
        return weights;
    }
    let scale = cap / gross;
    weights
        .into_iter()
        .map(|(symbol, w)| (symbol, w * scale))
        .collect()
}
