//! tplus core: domain types, indicators, portfolio ledger, ensemble
//! aggregation and the T+1 rebalancing engine.
//!
//! This crate holds the simulation core:
//! - Domain types (bars, enriched bars, positions, portfolio, orders, snapshots)
//! - Indicator transform (MACD, Bollinger, RSI, KDJ) with `Option` warm-up values
//! - Allocation aggregator with position and gross-exposure caps
//! - Rebalancing engine: liquidate, size at the open, mark at the close
//! - Proposal generator trait and the rule-based momentum scorer
//! - Bar source trait, CSV source and the universe definition

pub mod allocation;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod proposal;
