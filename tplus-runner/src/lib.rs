//! tplus runner: backtest orchestration on top of `tplus-core`.
//!
//! This crate provides:
//! - TOML run configuration with a content-addressed run id
//! - Market feed (universe + bar source + indicator enrichment) and a
//!   deterministic synthetic bar source
//! - The T+1 backtest driver
//! - Ensemble planner over rule-based and LLM proposal generators
//! - Prompt payload builder (JSON or Markdown bars)
//! - Performance analytics and JSON/CSV export

pub mod config;
pub mod data_loader;
pub mod ensemble;
pub mod export;
pub mod llm;
pub mod metrics;
pub mod payload;
pub mod runner;

pub use config::{default_agents, AgentSpec, ConfigError, ModelConfig, RunConfig, RunId};
pub use data_loader::{MarketFeed, SyntheticBarSource};
pub use ensemble::Ensemble;
pub use export::{
    export_equity_csv, export_json, export_orders_csv, import_json, load_artifacts,
    save_artifacts, RunArtifact, SCHEMA_VERSION,
};
pub use llm::{
    extract_allocations, HttpModelClient, LlmProposer, ModelClient, ModelError, PromptBuilder,
};
pub use metrics::{DrawdownWindow, PerformanceSummary};
pub use payload::{prepare_payload, BarFormat, PayloadError, PromptPayload, DEFAULT_MINIMUM_ROWS};
pub use runner::{BacktestError, BacktestResult, Backtester};
