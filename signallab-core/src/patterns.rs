//! Price-action labels for the latest bars: candle shape and break-and-retest.
//!
//! Both read only the validated series and are reported as context. They do
//! not take part in confidence scoring.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Shape of one candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    BullishPinBar,
    BearishPinBar,
    Doji,
    Normal,
}

impl CandlePattern {
    /// Classify by body and shadow proportions.
    ///
    /// - doji: body under 10% of the range
    /// - pin bar: body under 30% of the range and one shadow longer than
    ///   twice the body and longer than the other shadow; a long lower
    ///   shadow is bullish, a long upper shadow bearish
    /// - a bar with no range is normal
    pub fn classify(bar: &Bar) -> Self {
        let range = bar.high - bar.low;
        if range <= 0.0 {
            return CandlePattern::Normal;
        }
        let body = (bar.close - bar.open).abs();
        let upper = bar.high - bar.open.max(bar.close);
        let lower = bar.open.min(bar.close) - bar.low;

        if body < range * 0.1 {
            CandlePattern::Doji
        } else if body < range * 0.3 && lower > body * 2.0 && lower > upper {
            CandlePattern::BullishPinBar
        } else if body < range * 0.3 && upper > body * 2.0 && upper > lower {
            CandlePattern::BearishPinBar
        } else {
            CandlePattern::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandlePattern::BullishPinBar => "bullish_pin_bar",
            CandlePattern::BearishPinBar => "bearish_pin_bar",
            CandlePattern::Doji => "doji",
            CandlePattern::Normal => "normal",
        }
    }
}

/// Breakout of a recent high or low followed by a pullback that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakRetest {
    BullishRetest,
    BearishRetest,
    None,
}

impl BreakRetest {
    /// Label the latest bar.
    ///
    /// The second-to-last bar is the breakout candidate. Its close must clear
    /// the highest high (or lowest low) of the `lookback` bars before it.
    /// The latest close must then pull back toward that level without
    /// crossing it.
    pub fn detect(bars: &[Bar], lookback: usize) -> Self {
        let n = bars.len();
        if lookback == 0 || n < lookback + 2 {
            return BreakRetest::None;
        }
        let breakout = &bars[n - 2];
        let retest = &bars[n - 1];
        let window = &bars[n - 2 - lookback..n - 2];
        let recent_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let recent_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        if breakout.close > recent_high
            && retest.close < breakout.close
            && retest.close >= recent_high
        {
            BreakRetest::BullishRetest
        } else if breakout.close < recent_low
            && retest.close > breakout.close
            && retest.close <= recent_low
        {
            BreakRetest::BearishRetest
        } else {
            BreakRetest::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakRetest::BullishRetest => "bullish_retest",
            BreakRetest::BearishRetest => "bearish_retest",
            BreakRetest::None => "none",
        }
    }
}
