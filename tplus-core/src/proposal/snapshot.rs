//! Market snapshot handed to proposal generators.
//!
//! A snapshot is the serializable view of one session: the most recent bars
//! per symbol (one five-minute session's worth) plus the latest indicator
//! readings grouped by family.

use crate::domain::{EnrichedBar, MarketSession};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bars kept per symbol: one session of five-minute bars, with margin.
pub const SNAPSHOT_BAR_COUNT: usize = 78;

/// Timestamp layout used in snapshot records.
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSummary {
    pub line: Option<f64>,
    pub signal: Option<f64>,
    pub hist: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSummary {
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KdjSummary {
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
}

/// Latest indicator readings for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub macd: MacdSummary,
    pub bollinger: BollingerSummary,
    pub rsi: Option<f64>,
    pub kdj: KdjSummary,
}

impl IndicatorSummary {
    pub fn from_bar(bar: &EnrichedBar) -> Self {
        Self {
            macd: MacdSummary {
                line: bar.macd,
                signal: bar.macd_signal,
                hist: bar.macd_hist,
            },
            bollinger: BollingerSummary {
                upper: bar.boll_upper,
                middle: bar.boll_middle,
                lower: bar.boll_lower,
            },
            rsi: bar.rsi,
            kdj: KdjSummary {
                k: bar.kdj_k,
                d: bar.kdj_d,
                j: bar.kdj_j,
            },
        }
    }
}

/// One bar as presented to a proposal generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_middle: Option<f64>,
    pub boll_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub kdj_k: Option<f64>,
    pub kdj_d: Option<f64>,
    pub kdj_j: Option<f64>,
}

impl From<&EnrichedBar> for BarRecord {
    fn from(e: &EnrichedBar) -> Self {
        Self {
            timestamp: e.bar.timestamp.format(SNAPSHOT_TIME_FORMAT).to_string(),
            open: e.bar.open,
            high: e.bar.high,
            low: e.bar.low,
            close: e.bar.close,
            volume: e.bar.volume,
            macd: e.macd,
            macd_signal: e.macd_signal,
            macd_hist: e.macd_hist,
            boll_upper: e.boll_upper,
            boll_middle: e.boll_middle,
            boll_lower: e.boll_lower,
            rsi: e.rsi,
            kdj_k: e.kdj_k,
            kdj_d: e.kdj_d,
            kdj_j: e.kdj_j,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub indicators: IndicatorSummary,
    pub bars: Vec<BarRecord>,
}

impl SymbolSnapshot {
    /// Snapshot of the last `bar_count` bars; `None` for an empty series.
    pub fn from_bars(bars: &[EnrichedBar], bar_count: usize) -> Option<Self> {
        let last = bars.last()?;
        let start = bars.len().saturating_sub(bar_count);
        Some(Self {
            indicators: IndicatorSummary::from_bar(last),
            bars: bars[start..].iter().map(BarRecord::from).collect(),
        })
    }
}

/// Everything a proposal generator sees about the market on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub date: NaiveDate,
    pub symbols: BTreeMap<String, SymbolSnapshot>,
}

impl MarketSnapshot {
    pub fn from_session(session: &MarketSession) -> Self {
        Self::with_bar_count(session, SNAPSHOT_BAR_COUNT)
    }

    pub fn with_bar_count(session: &MarketSession, bar_count: usize) -> Self {
        let symbols = session
            .bars
            .iter()
            .filter_map(|(symbol, bars)| {
                SymbolSnapshot::from_bars(bars, bar_count).map(|snap| (symbol.clone(), snap))
            })
            .collect();
        Self {
            date: session.date,
            symbols,
        }
    }
}
