//! Property tests for ledger and aggregation invariants.
//!
//! Uses proptest to verify:
//! 1. Value conservation: rebalancing at a price set never creates or destroys value
//! 2. Aggregated weights respect both caps and are non-negative
//! 3. Aggregation is deterministic and independent of agent-map construction order
//! 4. Gross-cap scaling is exact

use proptest::prelude::*;
use std::collections::BTreeMap;
use tplus_core::allocation::{aggregate, apply_gross_cap, AgentDecision, RiskLimits};
use tplus_core::domain::{PortfolioState, PriceMap, TargetWeights};
use tplus_core::engine::rebalance;

const SYMBOLS: [&str; 6] = ["600000", "600036", "600519", "601318", "601888", "600900"];

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_prices() -> impl Strategy<Value = PriceMap> {
    prop::collection::vec(arb_price(), SYMBOLS.len()).prop_map(|prices| {
        SYMBOLS
            .iter()
            .zip(prices)
            .map(|(s, p)| (s.to_string(), p))
            .collect()
    })
}

fn arb_weights() -> impl Strategy<Value = TargetWeights> {
    prop::collection::btree_map(prop::sample::select(SYMBOLS.to_vec()), 0.0..0.3_f64, 0..6)
        .prop_map(|m| m.into_iter().map(|(s, w)| (s.to_string(), w)).collect())
}

fn arb_holdings() -> impl Strategy<Value = Vec<(&'static str, f64)>> {
    prop::collection::vec((prop::sample::select(SYMBOLS.to_vec()), 1.0..1_000.0_f64), 0..4)
}

fn arb_decision() -> impl Strategy<Value = AgentDecision> {
    (
        0.1..3.0_f64,
        prop::collection::btree_map(prop::sample::select(SYMBOLS.to_vec()), -1.0..2.0_f64, 0..6),
    )
        .prop_map(|(weight, allocs)| {
            let allocations = allocs.into_iter().map(|(s, w)| (s.to_string(), w)).collect();
            AgentDecision::new("agent", weight, allocations)
        })
}

fn arb_limits() -> impl Strategy<Value = RiskLimits> {
    (0.05..1.0_f64, 0.1..1.5_f64).prop_map(|(pos, gross)| RiskLimits::new(pos, gross))
}

// ── 1. Value conservation ────────────────────────────────────────────

proptest! {
    /// cash + Σ qty × price is unchanged by a rebalance at those prices.
    #[test]
    fn rebalance_conserves_value(
        cash in 1_000.0..1_000_000.0_f64,
        holdings in arb_holdings(),
        targets in arb_weights(),
        prices in arb_prices(),
    ) {
        let mut portfolio = PortfolioState::new(cash);
        for (symbol, qty) in &holdings {
            portfolio.apply_trade(symbol, *qty, 10.0);
        }
        let before = portfolio.total_value(&prices);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        rebalance(date, &mut portfolio, &targets, &prices);
        let after = portfolio.total_value(&prices);
        prop_assert!((before - after).abs() <= 1e-6 * before.abs().max(1.0));
    }

    /// After a rebalance with full price coverage, holdings match the targets.
    #[test]
    fn rebalance_reaches_targets(
        targets in arb_weights(),
        prices in arb_prices(),
    ) {
        let mut portfolio = PortfolioState::new(1_000_000.0);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        rebalance(date, &mut portfolio, &targets, &prices);
        let value = portfolio.total_value(&prices);
        for (symbol, weight) in &targets {
            let held = portfolio.quantity(symbol) * prices[symbol];
            prop_assert!((held - value * weight).abs() < 1e-3);
        }
        for symbol in portfolio.positions().keys() {
            prop_assert!(targets.contains_key(symbol));
        }
    }
}

// ── 2 & 3. Aggregation bounds and determinism ────────────────────────

proptest! {
    #[test]
    fn aggregate_respects_caps(
        decisions in prop::collection::vec(arb_decision(), 0..5),
        limits in arb_limits(),
    ) {
        let weights = aggregate(&decisions, &limits);
        let gross: f64 = weights.values().sum();
        prop_assert!(gross <= limits.max_gross_exposure + 1e-9);
        for w in weights.values() {
            prop_assert!(*w > 0.0);
            prop_assert!(*w <= limits.max_position_pct + 1e-12);
        }
    }

    #[test]
    fn aggregate_is_deterministic(
        decisions in prop::collection::vec(arb_decision(), 0..5),
        limits in arb_limits(),
    ) {
        let first = aggregate(&decisions, &limits);
        // Rebuild every allocation map in reverse insertion order.
        let rebuilt: Vec<AgentDecision> = decisions
            .iter()
            .map(|d| {
                let mut allocations = BTreeMap::new();
                for (s, w) in d.allocations.iter().rev() {
                    allocations.insert(s.clone(), *w);
                }
                AgentDecision::new(d.agent.clone(), d.weight, allocations)
            })
            .collect();
        let second = aggregate(&rebuilt, &limits);
        prop_assert_eq!(first.len(), second.len());
        for (s, w) in &first {
            prop_assert_eq!(w.to_bits(), second[s].to_bits());
        }
    }
}

// ── 4. Gross-cap scaling ─────────────────────────────────────────────

proptest! {
    #[test]
    fn gross_cap_scaling_exact(
        weights in prop::collection::vec(0.01..1.0_f64, 1..6),
        cap in 0.1..1.0_f64,
    ) {
        let input: TargetWeights = SYMBOLS
            .iter()
            .zip(&weights)
            .map(|(s, w)| (s.to_string(), *w))
            .collect();
        let gross: f64 = input.values().sum();
        let output = apply_gross_cap(input.clone(), cap);
        if gross > cap {
            prop_assert!((output.values().sum::<f64>() - cap).abs() < 1e-9);
            for (s, w) in &output {
                prop_assert!((w - input[s] * cap / gross).abs() < 1e-12);
            }
        } else {
            prop_assert_eq!(output, input);
        }
    }
}
