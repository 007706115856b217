//! Universe: the fixed basket of tradable symbols.
//!
//! Stored as a JSON list whose entries are either a bare symbol string or an
//! object with optional metadata:
//!
//! ```json
//! ["600000", {"symbol": "600519", "name": "Kweichow Moutai", "industry": "Liquor"}]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read universe file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid universe JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("universe entry has an empty symbol")]
    EmptySymbol,

    #[error("duplicate symbol in universe: {0}")]
    Duplicate(String),
}

fn default_exchange() -> String {
    "SSE".to_string()
}

/// Metadata for one universe member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default = "default_exchange")]
    pub exchange: String,
}

impl SymbolMeta {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            industry: None,
            exchange: default_exchange(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UniverseEntry {
    Symbol(String),
    Meta(SymbolMeta),
}

/// Ordered, duplicate-free list of universe members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Universe {
    members: Vec<SymbolMeta>,
}

impl Universe {
    pub fn new(members: Vec<SymbolMeta>) -> Result<Self, UniverseError> {
        let mut seen = BTreeSet::new();
        for member in &members {
            if member.symbol.trim().is_empty() {
                return Err(UniverseError::EmptySymbol);
            }
            if !seen.insert(member.symbol.as_str()) {
                return Err(UniverseError::Duplicate(member.symbol.clone()));
            }
        }
        Ok(Self { members })
    }

    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, UniverseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(symbols.into_iter().map(SymbolMeta::new).collect())
    }

    /// Load a universe from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, UniverseError> {
        let entries: Vec<UniverseEntry> = serde_json::from_str(content)?;
        let members = entries
            .into_iter()
            .map(|entry| match entry {
                UniverseEntry::Symbol(symbol) => SymbolMeta::new(symbol),
                UniverseEntry::Meta(meta) => meta,
            })
            .collect();
        Self::new(members)
    }

    /// Symbols in file order.
    pub fn symbols(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.symbol.as_str()).collect()
    }

    pub fn members(&self) -> &[SymbolMeta] {
        &self.members
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolMeta> {
        self.members.iter().find(|m| m.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A small sample of large-cap Shanghai constituents, used when no
    /// universe file is configured.
    pub fn default_sample() -> Self {
        let members = [
            ("600519", "Kweichow Moutai", "Food & Beverage"),
            ("601318", "Ping An Insurance", "Insurance"),
            ("600036", "China Merchants Bank", "Banking"),
            ("600900", "China Yangtze Power", "Utilities"),
            ("601012", "LONGi Green Energy", "Power Equipment"),
            ("600276", "Jiangsu Hengrui Medicine", "Pharmaceuticals"),
            ("601888", "China Tourism Group Duty Free", "Retail"),
            ("600030", "CITIC Securities", "Brokerage"),
        ]
        .into_iter()
        .map(|(symbol, name, industry)| SymbolMeta {
            symbol: symbol.to_string(),
            name: Some(name.to_string()),
            industry: Some(industry.to_string()),
            exchange: default_exchange(),
        })
        .collect();
        Self { members }
    }
}
