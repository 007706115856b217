//! CSV bar source: `<root>/<symbol>/<YYYY-MM-DD>.csv`.
//!
//! Headers are trimmed and lower-cased. `timestamp` plus
//! `open, high, low, close, volume, amount` are required; any other columns
//! are ignored. Rows are returned sorted by timestamp.

use super::provider::{BarSource, DataError};
use crate::domain::Bar;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

const PRICE_COLUMNS: [&str; 6] = ["open", "high", "low", "close", "volume", "amount"];

#[derive(Debug, Clone)]
pub struct CsvBarSource {
    root: PathBuf,
}

impl CsvBarSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `symbol`'s bars for `date`.
    pub fn path_for(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(symbol)
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol, date);
        if !path.exists() {
            return Err(DataError::NotFound {
                symbol: symbol.to_string(),
                date,
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        parse_bars(&content, &path)
    }
}

/// Parse intraday bars from CSV text. `path` is used for error context only.
pub fn parse_bars(content: &str, path: &Path) -> Result<Vec<Bar>, DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let ts_idx = column("timestamp")?;
    let mut price_idx = [0usize; 6];
    for (slot, name) in price_idx.iter_mut().zip(PRICE_COLUMNS) {
        *slot = column(name)?;
    }

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_ts = field(ts_idx);
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DataError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: "timestamp".to_string(),
            value: raw_ts.to_string(),
        })?;

        let mut values = [0.0f64; 6];
        for ((value, &idx), name) in values.iter_mut().zip(&price_idx).zip(PRICE_COLUMNS) {
            let raw = field(idx);
            let parsed = raw.parse::<f64>().ok().filter(|v| valid_value(name, *v));
            *value = parsed.ok_or_else(|| DataError::InvalidValue {
                path: path.to_path_buf(),
                row,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
        }
        let [open, high, low, close, volume, amount] = values;
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            amount,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(DataError::DuplicateTimestamp {
            path: path.to_path_buf(),
            timestamp: pair[1].timestamp.to_string(),
        });
    }
    Ok(bars)
}

/// Prices must be finite and positive; volume and amount finite and non-negative.
fn valid_value(column: &str, value: f64) -> bool {
    match column {
        "volume" | "amount" => value.is_finite() && value >= 0.0,
        _ => value.is_finite() && value > 0.0,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
