//! Serializable run configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [backtest]
//! start = "2024-01-02"
//! end = "2024-01-31"
//! initial_cash = 1000000.0
//!
//! [data]
//! root = "data/bars"
//! universe = "data/universe.json"
//!
//! [risk]
//! max_position_pct = 0.2
//!
//! [[agents]]
//! name = "growth"
//! description = "Growth style analyst"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tplus_core::allocation::RiskLimits;
use tplus_core::indicators::IndicatorConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    pub indicators: IndicatorConfig,
    pub risk: RiskLimits,
    pub model: ModelConfig,
    pub agents: Vec<AgentSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSection::default(),
            data: DataSection::default(),
            indicators: IndicatorConfig::default(),
            risk: RiskLimits::default(),
            model: ModelConfig::default(),
            agents: default_agents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    /// First trading date (inclusive).
    pub start: Option<NaiveDate>,
    /// Last trading date (inclusive).
    pub end: Option<NaiveDate>,
    pub initial_cash: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            initial_cash: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory holding `<symbol>/<YYYY-MM-DD>.csv` files.
    pub root: Option<PathBuf>,
    /// Universe JSON file; the built-in sample basket when absent.
    pub universe: Option<PathBuf>,
    /// Generate deterministic synthetic bars instead of reading files.
    pub synthetic: bool,
}

/// Chat-completions endpoint used by LLM agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub temperature: f64,
    /// Market payload is truncated to this many characters.
    pub max_payload_chars: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 60_000,
            retries: 2,
            temperature: 0.2,
            max_payload_chars: 120_000,
        }
    }
}

/// One LLM-backed decision maker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_agent_weight")]
    pub weight: f64,
    /// Prompt template file; the built-in template when absent.
    #[serde(default)]
    pub prompt_path: Option<PathBuf>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            weight: default_agent_weight(),
            prompt_path: None,
        }
    }
}

fn default_agent_weight() -> f64 {
    1.0
}

/// The growth / value / risk trio used when no agents are configured.
pub fn default_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new("growth", "Growth style analyst"),
        AgentSpec::new("value", "Value rotation analyst"),
        AgentSpec::new("risk", "Risk controller"),
    ]
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (self.backtest.start, self.backtest.end) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        let cash = self.backtest.initial_cash;
        if !(cash.is_finite() && cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be positive, got {cash}"
            )));
        }
        let pos = self.risk.max_position_pct;
        if !(pos > 0.0 && pos <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max_position_pct must be in (0, 1], got {pos}"
            )));
        }
        let gross = self.risk.max_gross_exposure;
        if !(gross.is_finite() && gross > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_gross_exposure must be positive, got {gross}"
            )));
        }
        let zero = self.indicators.zero_periods();
        if !zero.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "indicator periods must be non-zero: {}",
                zero.join(", ")
            )));
        }
        if !(self.indicators.boll_k.is_finite() && self.indicators.boll_k > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "boll_k must be positive, got {}",
                self.indicators.boll_k
            )));
        }
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ConfigError::Invalid("agent with empty name".into()));
            }
            if !(agent.weight.is_finite() && agent.weight >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "agent '{}' has invalid weight {}",
                    agent.name, agent.weight
                )));
            }
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId, which names their
    /// artifact directory.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }
}
