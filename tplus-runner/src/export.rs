//! Export: JSON and CSV artifacts for a finished run.
//!
//! - **JSON**: full round-trip bundle with schema versioning
//! - **CSV**: equity curve and order log for external analysis tools
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected on
//! load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tplus_core::domain::{EquitySnapshot, TargetWeights, TradeOrder};

use crate::metrics::PerformanceSummary;
use crate::runner::BacktestResult;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything persisted for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub equity_curve: Vec<EquitySnapshot>,
    pub orders: Vec<TradeOrder>,
    pub target_weights: BTreeMap<NaiveDate, TargetWeights>,
    pub summary: PerformanceSummary,
}

impl RunArtifact {
    pub fn new(run_id: impl Into<String>, result: &BacktestResult, summary: PerformanceSummary) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.into(),
            equity_curve: result.equity_curve.clone(),
            orders: result.orders.clone(),
            target_weights: result.target_weights.clone(),
            summary,
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(artifact: &RunArtifact) -> Result<String> {
    serde_json::to_string_pretty(artifact).context("failed to serialize run artifact to JSON")
}

/// Deserialize a run artifact, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<RunArtifact> {
    let artifact: RunArtifact =
        serde_json::from_str(json).context("failed to deserialize run artifact from JSON")?;
    if artifact.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            artifact.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(artifact)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: date, equity, cash
pub fn export_equity_csv(curve: &[EquitySnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "cash"])?;
    for s in curve {
        wtr.write_record([
            s.date.to_string(),
            format!("{:.2}", s.equity),
            format!("{:.2}", s.cash),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, symbol, side, quantity, price, notional
pub fn export_orders_csv(orders: &[TradeOrder]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "symbol", "side", "quantity", "price", "notional"])?;
    for o in orders {
        wtr.write_record([
            o.date.to_string().as_str(),
            o.symbol.as_str(),
            o.side.as_str(),
            format!("{:.6}", o.quantity).as_str(),
            format!("{:.4}", o.price).as_str(),
            format!("{:.2}", o.notional).as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `result.json`, `equity.csv` and `orders.csv` under
/// `output_dir/<run_id>/`, returning that directory.
pub fn save_artifacts(artifact: &RunArtifact, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&artifact.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(artifact)?)
        .context("failed to write result.json")?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(&artifact.equity_curve)?)
        .context("failed to write equity.csv")?;
    std::fs::write(run_dir.join("orders.csv"), export_orders_csv(&artifact.orders)?)
        .context("failed to write orders.csv")?;

    Ok(run_dir)
}

/// Load a run artifact from a directory written by `save_artifacts`.
pub fn load_artifacts(dir: &Path) -> Result<RunArtifact> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
