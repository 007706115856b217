//! Market feed and the synthetic bar source.
//!
//! `MarketFeed` turns a bar source plus a universe into one enriched
//! `MarketSession` per date:
//! 1. Fetch every universe symbol from the source
//! 2. Skip symbols the source has no data for (logged at warn)
//! 3. Propagate every other source error
//! 4. Enrich the remaining series in parallel
//!
//! `SyntheticBarSource` is a developer mode: a deterministic intraday random
//! walk, so the whole pipeline can run without any files on disk.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use tplus_core::data::{BarSource, DataError, Universe};
use tplus_core::domain::{Bar, EnrichedBar, MarketSession};
use tplus_core::indicators::IndicatorSuite;

/// Loads and enriches one session at a time.
pub struct MarketFeed {
    source: Box<dyn BarSource>,
    universe: Universe,
    suite: IndicatorSuite,
}

impl MarketFeed {
    pub fn new(source: Box<dyn BarSource>, universe: Universe, suite: IndicatorSuite) -> Self {
        Self {
            source,
            universe,
            suite,
        }
    }

    pub fn source(&self) -> &dyn BarSource {
        self.source.as_ref()
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn suite(&self) -> &IndicatorSuite {
        &self.suite
    }

    /// Enriched bars for every universe symbol that has data on `date`.
    pub fn load_for_date(&self, date: NaiveDate) -> Result<MarketSession, DataError> {
        let symbols = self.universe.symbols();
        let fetched: Vec<(&str, Result<Vec<EnrichedBar>, DataError>)> = symbols
            .par_iter()
            .map(|symbol| {
                let enriched = self
                    .source
                    .fetch_bars(symbol, date)
                    .map(|bars| self.suite.enrich(&bars));
                (*symbol, enriched)
            })
            .collect();

        let mut bars = BTreeMap::new();
        for (symbol, result) in fetched {
            match result {
                Ok(series) if series.is_empty() => {
                    warn!(%symbol, %date, source = self.source.name(), "empty bar series, skipping");
                }
                Ok(series) => {
                    bars.insert(symbol.to_string(), series);
                }
                Err(err) if err.is_not_found() => {
                    warn!(%symbol, %date, source = self.source.name(), "no data, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        debug!(%date, loaded = bars.len(), universe = symbols.len(), "session loaded");
        Ok(MarketSession::new(date, bars))
    }
}

// ─── Synthetic source ───────────────────────────────────────────────

/// Bars per half-session (09:35..=11:30 and 13:05..=15:00).
const BARS_PER_HALF: i64 = 24;

/// Deterministic random-walk bars, one five-minute session per weekday.
///
/// Each (symbol, date) pair is seeded independently, so any single date can
/// be regenerated without the dates before it.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBarSource;

impl SyntheticBarSource {
    pub fn new() -> Self {
        Self
    }

    fn seed(symbol: &str, date: NaiveDate) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(b"/");
        hasher.update(date.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Price level the symbol hovers around, in [5, 200).
    fn base_price(symbol: &str) -> f64 {
        let hash = blake3::hash(symbol.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        5.0 + (u64::from_le_bytes(head) % 19_500) as f64 / 100.0
    }

    fn session_times(date: NaiveDate) -> Vec<chrono::NaiveDateTime> {
        let halves = [
            NaiveTime::from_hms_opt(9, 35, 0),
            NaiveTime::from_hms_opt(13, 5, 0),
        ];
        halves
            .into_iter()
            .flatten()
            .flat_map(|first| {
                (0..BARS_PER_HALF).map(move |i| date.and_time(first) + Duration::minutes(5 * i))
            })
            .collect()
    }
}

impl BarSource for SyntheticBarSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(DataError::NotFound {
                symbol: symbol.to_string(),
                date,
            });
        }

        let mut rng = StdRng::from_seed(Self::seed(symbol, date));
        let mut price = Self::base_price(symbol) * (1.0 + rng.gen_range(-0.05..0.05));

        let bars = Self::session_times(date)
            .into_iter()
            .map(|timestamp| {
                let step: f64 = rng.gen_range(-0.004..0.004);
                let open = price;
                let close = price * (1.0 + step);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
                let volume = rng.gen_range(10_000..200_000u64) as f64;
                price = close;
                Bar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    amount: volume * (open + close) / 2.0,
                }
            })
            .collect();
        Ok(bars)
    }
}
