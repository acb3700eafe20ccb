//! Signal: the immutable engine output for one symbol.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::confidence::ConfidenceScore;
use crate::regime::RegimeLabels;

/// Directional recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Buy,
    Sell,
    Hold,
}

impl Bias {
    pub fn is_directional(self) -> bool {
        !matches!(self, Bias::Hold)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bias::Buy => "BUY",
            Bias::Sell => "SELL",
            Bias::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Executable price levels. Only produced for BUY/SELL with a usable ATR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

/// Engine output for one symbol at its latest bar.
///
/// Identical `(BarSeries, EngineConfig)` inputs always produce an identical
/// `Signal`, down to its JSON bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub regime: RegimeLabels,
    pub confidence: ConfidenceScore,
    pub bias: Bias,
    /// `None` for HOLD, or when ATR is unavailable or not positive.
    pub levels: Option<PriceLevels>,
}

impl Signal {
    /// Content hash of the canonical JSON encoding (BLAKE3, hex).
    ///
    /// Used to check replay: same inputs, same fingerprint.
    pub fn fingerprint(&self) -> String {
        // Serializing plain data with derived impls does not fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }

    pub fn has_levels(&self) -> bool {
        self.levels.is_some()
    }
}
