//! Bar, the fundamental market data unit, and the validated series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single interval.
///
/// `volume` is `None` when the provider did not report a numeric volume for
/// this bar (e.g. spot FX and metals). Absence is never read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, open/close inside the range,
    /// strictly positive prices.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// Typical price (H + L + C) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Validated, ordered bar series for one symbol.
///
/// Invariants (established by [`crate::data::validate`]):
/// - timestamps strictly increasing, no duplicates
/// - every bar passes [`Bar::is_sane`]
/// - length >= the minimum the series was validated against
///
/// There is no mutable access; a new series is built for every analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
    volume_available: bool,
}

impl BarSeries {
    /// Crate-private constructor; callers go through the validator.
    pub(crate) fn from_validated(symbol: String, bars: Vec<Bar>) -> Self {
        let volume_available = bars.iter().any(|b| b.volume.is_some());
        Self {
            symbol,
            bars,
            volume_available,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar. Validated series are never empty.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// False when no bar in the series carries a numeric volume.
    pub fn volume_available(&self) -> bool {
        self.volume_available
    }
}
