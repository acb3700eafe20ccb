//! Look-ahead contamination tests for every indicator in the battery.
//!
//! No indicator value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on truncated series (bars 0..100) and full series (bars 0..200).
//! Assert bars 0..100 are identical between both runs. Any difference means the
//! indicator is leaking future data into past values.

use chrono::NaiveDate;
use signallab_core::domain::Bar;
use signallab_core::indicators::*;

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;

        bars.push(Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: Some(1000.0 + i as f64 * 100.0),
        });
    }

    bars
}

/// Assert that the indicator produces identical values for bars 0..truncated_len
/// whether computed on a truncated or full series.
fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = &full_bars[..truncated_len];
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(truncated);

    assert_eq!(
        truncated_result.len(),
        truncated_len,
        "{}: truncated result length mismatch",
        indicator.name()
    );
    assert_eq!(
        full_result.len(),
        full_bars.len(),
        "{}: full result length mismatch",
        indicator.name()
    );

    for i in 0..truncated_len {
        let t = truncated_result[i];
        let f = full_result[i];

        if t.is_nan() && f.is_nan() {
            continue;
        }

        assert!(
            !t.is_nan() && !f.is_nan(),
            "{}: NaN mismatch at bar {i} (truncated={t}, full={f})",
            indicator.name()
        );

        assert!(
            (t - f).abs() < 1e-10,
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}, diff={}",
            indicator.name(),
            (t - f).abs()
        );
    }
}

/// Values before `lookback` are NaN, values from `lookback` on are finite.
fn assert_warmup(indicator: &dyn Indicator, bars: &[Bar]) {
    let values = indicator.compute(bars);
    let lookback = indicator.lookback();
    for (i, v) in values.iter().enumerate() {
        if i < lookback {
            assert!(v.is_nan(), "{}: expected NaN at bar {i}, got {v}", indicator.name());
        } else {
            assert!(v.is_finite(), "{}: expected value at bar {i}", indicator.name());
        }
    }
}

#[test]
fn lookahead_sma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(20), &bars, 100);
    assert_no_lookahead(&Sma::new(50), &bars, 100);
}

#[test]
fn lookahead_ema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(12), &bars, 100);
    assert_no_lookahead(&Ema::new(26), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::new(7), &bars, 100);
}

#[test]
fn lookahead_macd() {
    let bars = make_test_bars(200);
    for line in [MacdLine::Line, MacdLine::Signal, MacdLine::Histogram] {
        assert_no_lookahead(&Macd::new(12, 26, 9, line), &bars, 100);
    }
}

#[test]
fn lookahead_stochastic() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Stochastic::new(14, 3, StochasticLine::K), &bars, 100);
    assert_no_lookahead(&Stochastic::new(14, 3, StochasticLine::D), &bars, 100);
}

#[test]
fn lookahead_cci() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Cci::new(20), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
    assert_no_lookahead(&Atr::new(5), &bars, 100);
}

#[test]
fn lookahead_adx() {
    let bars = make_test_bars(200);
    for line in [AdxLine::Adx, AdxLine::PlusDi, AdxLine::MinusDi] {
        assert_no_lookahead(&Adx::new(14, line), &bars, 100);
        assert_no_lookahead(&Adx::new(7, line), &bars, 100);
    }
}

#[test]
fn lookahead_bollinger() {
    let bars = make_test_bars(200);
    for band in [BollingerBand::Upper, BollingerBand::Middle, BollingerBand::Lower] {
        assert_no_lookahead(&Bollinger::new(20, 2.0, band), &bars, 100);
    }
}

#[test]
fn lookahead_volume_indicators() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Obv::new(), &bars, 100);
    assert_no_lookahead(&Cmf::new(20), &bars, 100);
    assert_no_lookahead(&AccumulationDistribution::new(), &bars, 100);
}

#[test]
fn lookahead_aroon() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Aroon::up(25), &bars, 100);
    assert_no_lookahead(&Aroon::down(25), &bars, 100);
}

#[test]
fn warmup_matches_lookback() {
    let bars = make_test_bars(120);
    let battery: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(50)),
        Box::new(Ema::new(26)),
        Box::new(Rsi::new(14)),
        Box::new(Macd::new(12, 26, 9, MacdLine::Signal)),
        Box::new(Stochastic::new(14, 3, StochasticLine::D)),
        Box::new(Cci::new(20)),
        Box::new(Atr::new(14)),
        Box::new(Adx::new(14, AdxLine::Adx)),
        Box::new(Bollinger::new(20, 2.0, BollingerBand::Lower)),
        Box::new(Cmf::new(20)),
        Box::new(Aroon::down(25)),
        Box::new(AccumulationDistribution::new()),
    ];
    for indicator in &battery {
        assert_warmup(indicator.as_ref(), &bars);
    }
}
