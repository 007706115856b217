//! Bar source trait and structured error types.
//!
//! `BarSource` abstracts over where intraday bars come from (CSV files on
//! disk, the synthetic generator) so the feed can swap implementations and
//! tests can mock them.

use crate::domain::Bar;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for bar loading.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for {symbol} on {date}")]
    NotFound { symbol: String, date: NaiveDate },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("missing required column `{column}` in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid {column} value {value:?} at row {row} in {path}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("duplicate timestamp {timestamp} in {path}")]
    DuplicateTimestamp { path: PathBuf, timestamp: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Trait for intraday bar sources.
///
/// Caching and retry policy, if any, belong to the implementation.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// All bars for `symbol` on `date`, ordered by strictly increasing timestamp.
    ///
    /// Returns `DataError::NotFound` when the source has nothing for that pair.
    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError>;
}
