//! Prompt payloads: the full enriched market view for one trade date.
//!
//! Shape:
//!
//! ```json
//! {
//!   "trade_date": "2024-01-02",
//!   "universe": ["600519", "601318"],
//!   "bars": {
//!     "600519": {"meta": {...}, "indicators": {...}, "bars": [...]}
//!   }
//! }
//! ```
//!
//! With `BarFormat::Markdown` each symbol carries `bars_markdown` (a table)
//! instead of `bars`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use tplus_core::data::{BarSource, DataError, SymbolMeta, Universe};
use tplus_core::domain::EnrichedBar;
use tplus_core::indicators::IndicatorSuite;
use tplus_core::proposal::{BarRecord, IndicatorSummary};

/// Fewest bars a symbol may have before the payload is refused.
pub const DEFAULT_MINIMUM_ROWS: usize = 20;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("{symbol} only has {rows} rows for {date}; expected >= {minimum}")]
    TooFewRows {
        symbol: String,
        date: NaiveDate,
        rows: usize,
        minimum: usize,
    },

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How bars are rendered inside a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarFormat {
    #[default]
    Json,
    Markdown,
}

impl FromStr for BarFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown bar format '{other}' (expected json or markdown)")),
        }
    }
}

impl fmt::Display for BarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPayload {
    pub meta: SymbolMeta,
    pub indicators: IndicatorSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars: Option<Vec<BarRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars_markdown: Option<String>,
}

impl SymbolPayload {
    /// Payload for one enriched series; `None` for an empty series.
    pub fn build(meta: SymbolMeta, bars: &[EnrichedBar], format: BarFormat) -> Option<Self> {
        let last = bars.last()?;
        let records: Vec<BarRecord> = bars.iter().map(BarRecord::from).collect();
        let (bars, bars_markdown) = match format {
            BarFormat::Json => (Some(records), None),
            BarFormat::Markdown => (None, Some(markdown_table(&records))),
        };
        Some(Self {
            meta,
            indicators: IndicatorSummary::from_bar(last),
            bars,
            bars_markdown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub trade_date: NaiveDate,
    pub universe: Vec<String>,
    pub bars: BTreeMap<String, SymbolPayload>,
}

impl PromptPayload {
    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the payload for every universe member on `date`.
///
/// Fails if any member cannot be loaded or has fewer than `minimum_rows`
/// bars.
pub fn prepare_payload(
    date: NaiveDate,
    source: &dyn BarSource,
    universe: &Universe,
    suite: &IndicatorSuite,
    format: BarFormat,
    minimum_rows: usize,
) -> Result<PromptPayload, PayloadError> {
    let mut bars = BTreeMap::new();
    for meta in universe.members() {
        let raw = source.fetch_bars(&meta.symbol, date)?;
        if raw.len() < minimum_rows || raw.is_empty() {
            return Err(PayloadError::TooFewRows {
                symbol: meta.symbol.clone(),
                date,
                rows: raw.len(),
                minimum: minimum_rows,
            });
        }
        let enriched = suite.enrich(&raw);
        if let Some(payload) = SymbolPayload::build(meta.clone(), &enriched, format) {
            bars.insert(meta.symbol.clone(), payload);
        }
    }
    Ok(PromptPayload {
        trade_date: date,
        universe: universe.symbols().into_iter().map(str::to_string).collect(),
        bars,
    })
}

const MARKDOWN_COLUMNS: [&str; 16] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "macd",
    "macd_signal",
    "macd_hist",
    "boll_upper",
    "boll_middle",
    "boll_lower",
    "rsi",
    "kdj_k",
    "kdj_d",
    "kdj_j",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Render bar records as a Markdown table, two decimals, blank when undefined.
pub fn markdown_table(records: &[BarRecord]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&MARKDOWN_COLUMNS.join(" | "));
    out.push_str(" |\n|");
    out.push_str(&"---|".repeat(MARKDOWN_COLUMNS.len()));
    out.push('\n');

    for r in records {
        let cells = [
            r.timestamp.clone(),
            cell(Some(r.open)),
            cell(Some(r.high)),
            cell(Some(r.low)),
            cell(Some(r.close)),
            cell(Some(r.volume)),
            cell(r.macd),
            cell(r.macd_signal),
            cell(r.macd_hist),
            cell(r.boll_upper),
            cell(r.boll_middle),
            cell(r.boll_lower),
            cell(r.rsi),
            cell(r.kdj_k),
            cell(r.kdj_d),
            cell(r.kdj_j),
        ];
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::SyntheticBarSource;
    use tplus_core::domain::Bar;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    struct Short;

    impl BarSource for Short {
        fn name(&self) -> &str {
            "short"
        }

        fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
            let mut bars = SyntheticBarSource::new().fetch_bars(symbol, date)?;
            bars.truncate(10);
            Ok(bars)
        }
    }

    #[test]
    fn bar_format_parses() {
        assert_eq!("json".parse::<BarFormat>().unwrap(), BarFormat::Json);
        assert_eq!("Markdown".parse::<BarFormat>().unwrap(), BarFormat::Markdown);
        assert!("xml".parse::<BarFormat>().is_err());
    }

    #[test]
    fn json_payload_covers_universe() {
        let universe = Universe::from_symbols(["600519", "601318"]).unwrap();
        let payload = prepare_payload(
            date(),
            &SyntheticBarSource::new(),
            &universe,
            &IndicatorSuite::default(),
            BarFormat::Json,
            DEFAULT_MINIMUM_ROWS,
        )
        .unwrap();

        assert_eq!(payload.universe, vec!["600519", "601318"]);
        let moutai = &payload.bars["600519"];
        assert_eq!(moutai.meta.symbol, "600519");
        assert_eq!(moutai.bars.as_ref().map(Vec::len), Some(48));
        assert!(moutai.bars_markdown.is_none());
        assert!(moutai.indicators.rsi.is_some());

        let json: serde_json::Value =
            serde_json::from_str(&payload.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["trade_date"], "2024-01-02");
        // Warm-up values serialize as null, never NaN.
        assert!(json["bars"]["600519"]["bars"][0]["rsi"].is_null());
        assert!(json["bars"]["600519"].get("bars_markdown").is_none());
    }

    #[test]
    fn markdown_payload_renders_table() {
        let universe = Universe::from_symbols(["600036"]).unwrap();
        let payload = prepare_payload(
            date(),
            &SyntheticBarSource::new(),
            &universe,
            &IndicatorSuite::default(),
            BarFormat::Markdown,
            DEFAULT_MINIMUM_ROWS,
        )
        .unwrap();

        let table = payload.bars["600036"].bars_markdown.as_deref().unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + 48);
        assert!(lines[0].starts_with("| timestamp | open |"));
        assert!(lines[2].starts_with("| 2024-01-02 09:35 |"));
        // First row: MACD is defined from bar 0, RSI is still warming up.
        assert!(lines[2].contains("|  |"));
        assert!(payload.bars["600036"].bars.is_none());
    }

    #[test]
    fn too_few_rows_is_an_error() {
        let universe = Universe::from_symbols(["600036"]).unwrap();
        let err = prepare_payload(
            date(),
            &Short,
            &universe,
            &IndicatorSuite::default(),
            BarFormat::Json,
            DEFAULT_MINIMUM_ROWS,
        )
        .unwrap_err();
        assert!(matches!(err, PayloadError::TooFewRows { rows: 10, minimum: 20, .. }));
    }

    #[test]
    fn missing_symbol_propagates() {
        let universe = Universe::from_symbols(["600036"]).unwrap();
        // 2024-01-06 is a Saturday
        let err = prepare_payload(
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            &SyntheticBarSource::new(),
            &universe,
            &IndicatorSuite::default(),
            BarFormat::Json,
            DEFAULT_MINIMUM_ROWS,
        )
        .unwrap_err();
        assert!(matches!(err, PayloadError::Data(ref e) if e.is_not_found()));
    }

    #[test]
    fn markdown_cells_are_two_decimals() {
        let record = BarRecord {
            timestamp: "2024-01-02 09:35".into(),
            open: 10.0,
            high: 10.456,
            low: 9.9,
            close: 10.1,
            volume: 1200.0,
            macd: Some(0.01234),
            macd_signal: None,
            macd_hist: None,
            boll_upper: None,
            boll_middle: None,
            boll_lower: None,
            rsi: None,
            kdj_k: None,
            kdj_d: None,
            kdj_j: None,
        };
        let table = markdown_table(&[record]);
        let row = table.lines().nth(2).unwrap();
        assert!(row.starts_with("| 2024-01-02 09:35 | 10.00 | 10.46 | 9.90 | 10.10 | 1200.00 | 0.01 |"));
    }
}
