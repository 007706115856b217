//! Look-ahead contamination tests for every enriched indicator.
//!
//! No indicator value at bar t may depend on bars after t.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Bars 0..100 must be identical between both runs.

use chrono::NaiveDate;
use tplus_core::domain::Bar;
use tplus_core::indicators::{Indicator, IndicatorConfig, IndicatorSuite, RsiSmoothing};

/// Deterministic five-minute bars with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 35, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            timestamp: base + chrono::Duration::minutes(5 * i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000.0 + i as f64 * 100.0,
            amount: close * 1000.0,
        });
    }

    bars
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let full = indicator.compute(full_bars);
    let truncated = indicator.compute(&full_bars[..truncated_len]);

    assert_eq!(truncated.len(), truncated_len, "{}: truncated length", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}: full length", indicator.name());

    for i in 0..truncated_len {
        match (truncated[i], full[i]) {
            (None, None) => {}
            (Some(t), Some(f)) => assert!(
                (t - f).abs() < 1e-10,
                "{}: look-ahead at bar {i} (truncated={t}, full={f})",
                indicator.name()
            ),
            (t, f) => panic!(
                "{}: definedness mismatch at bar {i} (truncated={t:?}, full={f:?})",
                indicator.name()
            ),
        }
    }
}

#[test]
fn default_suite_has_no_lookahead() {
    let bars = make_test_bars(200);
    for indicator in IndicatorSuite::default().indicators() {
        assert_no_lookahead(indicator.as_ref(), &bars, 100);
    }
}

#[test]
fn wilder_rsi_has_no_lookahead() {
    let bars = make_test_bars(200);
    let suite = IndicatorSuite::new(IndicatorConfig {
        rsi_smoothing: RsiSmoothing::Wilder,
        ..IndicatorConfig::default()
    });
    for indicator in suite.indicators() {
        assert_no_lookahead(indicator.as_ref(), &bars, 100);
    }
}

#[test]
fn short_windows_have_no_lookahead() {
    let bars = make_test_bars(60);
    let suite = IndicatorSuite::new(IndicatorConfig {
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 2,
        boll_window: 5,
        rsi_period: 3,
        kdj_window: 4,
        kdj_smoothing: 2,
        ..IndicatorConfig::default()
    });
    for cut in [1, 5, 17, 59] {
        for indicator in suite.indicators() {
            assert_no_lookahead(indicator.as_ref(), &bars, cut);
        }
    }
}

#[test]
fn values_past_lookback_are_defined() {
    let bars = make_test_bars(200);
    for indicator in IndicatorSuite::default().indicators() {
        let values = indicator.compute(&bars);
        let lookback = indicator.lookback();
        assert!(
            values[lookback..].iter().all(Option::is_some),
            "{}: undefined value after warm-up",
            indicator.name()
        );
        assert!(
            values[..lookback].iter().all(Option::is_none),
            "{}: defined value during warm-up",
            indicator.name()
        );
    }
}

#[test]
fn enrich_matches_individual_indicators() {
    let bars = make_test_bars(120);
    let suite = IndicatorSuite::default();
    let enriched = suite.enrich(&bars);
    let values = suite.compute(&bars);
    for (i, e) in enriched.iter().enumerate() {
        assert_eq!(e.macd_hist, values.get("macd_hist", i));
        assert_eq!(e.rsi, values.get("rsi", i));
        assert_eq!(e.kdj_j, values.get("kdj_j", i));
    }
}
