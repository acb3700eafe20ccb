//! Regime classification: qualitative labels from an indicator snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battery::IndicatorSnapshot;
use crate::config::ScoringThresholds;
use crate::indicators::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    /// Mixed ordering, a tie, or an unavailable EMA.
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumStrength {
    Strong,
    Weak,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeFlow {
    Positive,
    Negative,
    Unavailable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Sideways => "sideways",
        }
    }
}

impl MomentumStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            MomentumStrength::Strong => "strong",
            MomentumStrength::Weak => "weak",
            MomentumStrength::Unavailable => "unavailable",
        }
    }
}

impl VolumeFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeFlow::Positive => "positive",
            VolumeFlow::Negative => "negative",
            VolumeFlow::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeLabels {
    pub trend: Trend,
    pub momentum: MomentumStrength,
    /// ATR passed through unchanged.
    pub volatility: Reading,
    pub volume_flow: VolumeFlow,
}

/// price > EMA fast > EMA slow is bullish, the mirror is bearish, anything
/// else (including equality) is sideways.
pub fn classify_trend(price: f64, ema_fast: Reading, ema_slow: Reading) -> Trend {
    match (ema_fast.value(), ema_slow.value()) {
        (Some(fast), Some(slow)) if price > fast && fast > slow => Trend::Bullish,
        (Some(fast), Some(slow)) if price < fast && fast < slow => Trend::Bearish,
        _ => Trend::Sideways,
    }
}

pub fn classify(snapshot: &IndicatorSnapshot, thresholds: &ScoringThresholds) -> RegimeLabels {
    let trend = classify_trend(snapshot.price, snapshot.ema_fast, snapshot.ema_slow);

    let momentum = match snapshot.adx.adx.value() {
        Some(adx) if adx >= thresholds.adx_strong => MomentumStrength::Strong,
        Some(_) => MomentumStrength::Weak,
        None => MomentumStrength::Unavailable,
    };

    let volume_flow = match snapshot.cmf.value() {
        Some(cmf) if cmf > 0.0 => VolumeFlow::Positive,
        Some(_) => VolumeFlow::Negative,
        None => VolumeFlow::Unavailable,
    };

    RegimeLabels {
        trend,
        momentum,
        volatility: snapshot.atr,
        volume_flow,
    }
}
