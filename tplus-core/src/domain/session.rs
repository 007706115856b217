//! MarketSession: every symbol's enriched bars for one trading date.

use super::bar::EnrichedBar;
use super::PriceMap;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Enriched intraday bars for each tradable symbol on `date`.
///
/// Symbols with no data for the date are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSession {
    pub date: NaiveDate,
    pub bars: BTreeMap<String, Vec<EnrichedBar>>,
}

impl MarketSession {
    pub fn new(date: NaiveDate, bars: BTreeMap<String, Vec<EnrichedBar>>) -> Self {
        Self { date, bars }
    }

    /// Session open per symbol: the first bar's open.
    pub fn open_prices(&self) -> PriceMap {
        self.bars
            .iter()
            .filter_map(|(symbol, bars)| bars.first().map(|b| (symbol.clone(), b.bar.open)))
            .collect()
    }

    /// Session close per symbol: the last bar's close.
    pub fn close_prices(&self) -> PriceMap {
        self.bars
            .iter()
            .filter_map(|(symbol, bars)| bars.last().map(|b| (symbol.clone(), b.bar.close)))
            .collect()
    }

    /// Most recent enriched bar for `symbol`.
    pub fn latest(&self, symbol: &str) -> Option<&EnrichedBar> {
        self.bars.get(symbol).and_then(|bars| bars.last())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn bar(hour: u32, open: f64, close: f64) -> EnrichedBar {
        EnrichedBar::bare(Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1.0,
            amount: close,
        })
    }

    #[test]
    fn open_and_close_come_from_first_and_last_bar() {
        let mut bars = BTreeMap::new();
        bars.insert("A".to_string(), vec![bar(10, 5.0, 5.5), bar(14, 5.6, 6.0)]);
        bars.insert("B".to_string(), vec![bar(10, 12.0, 11.0)]);
        bars.insert("C".to_string(), Vec::new());
        let session = MarketSession::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), bars);

        let opens = session.open_prices();
        let closes = session.close_prices();
        assert_eq!(opens["A"], 5.0);
        assert_eq!(closes["A"], 6.0);
        assert_eq!(opens["B"], 12.0);
        assert_eq!(closes["B"], 11.0);
        assert!(!opens.contains_key("C"));
        assert_eq!(session.latest("A").unwrap().bar.close, 6.0);
    }
}
