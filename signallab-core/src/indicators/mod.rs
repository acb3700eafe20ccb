//! Technical indicators.
//!
//! Every indicator implements [`Indicator`]: full bar history in, one output
//! series of the same length out, `f64::NAN` during warmup and wherever the
//! value is mathematically undefined. Multi-output indicators (MACD,
//! stochastic, ADX, Bollinger) are exposed as separate named instances per
//! output, keeping the single-series trait unchanged, plus a function that
//! computes all outputs in one pass for the battery.
//!
//! Scoring never reads raw series: the battery turns the last value of each
//! series into a [`Reading`].

pub mod accdist;
pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod cmf;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use accdist::AccumulationDistribution;
pub use adx::{Adx, AdxLine};
pub use aroon::{Aroon, AroonLine};
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use cci::Cci;
pub use cmf::Cmf;
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use obv::Obv;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticLine};

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that can never carry a value.
    ///
    /// The series has a value at index `i` only when `i >= lookback()`.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Why an indicator has no value at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailability {
    /// Series shorter than the indicator's window.
    InsufficientHistory,
    /// Volume indicator on bars without volume.
    MissingVolume,
    /// Zero range or zero deviation in a denominator.
    Undefined,
    /// Caller restricted the battery and did not ask for this one.
    NotRequested,
}

impl Unavailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unavailability::InsufficientHistory => "insufficient_history",
            Unavailability::MissingVolume => "missing_volume",
            Unavailability::Undefined => "undefined",
            Unavailability::NotRequested => "not_requested",
        }
    }
}

/// One indicator output at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    Value(f64),
    Unavailable(Unavailability),
}

impl Reading {
    /// Read the last element of `series`.
    ///
    /// A series of `len <= lookback` reports `InsufficientHistory`; past the
    /// warmup, a non-finite value reports `Undefined`.
    pub fn at_end(series: &[f64], lookback: usize) -> Self {
        match series.last() {
            None => Reading::Unavailable(Unavailability::InsufficientHistory),
            Some(_) if series.len() <= lookback => {
                Reading::Unavailable(Unavailability::InsufficientHistory)
            }
            Some(v) if v.is_finite() => Reading::Value(*v),
            Some(_) => Reading::Unavailable(Unavailability::Undefined),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn unavailability(&self) -> Option<Unavailability> {
        match self {
            Reading::Value(_) => None,
            Reading::Unavailable(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v:.2}"),
            Reading::Unavailable(reason) => write!(f, "unavailable ({})", reason.as_str()),
        }
    }
}

/// Full indicator series by name, for charting. Never read by scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorHistory {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Closing prices of `bars`.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: Some(1000.0),
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close, volume) tuples.
#[cfg(test)]
pub fn make_ohlcv_bars(data: &[(f64, f64, f64, f64, Option<f64>)]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
