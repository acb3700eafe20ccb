//! SignalLab Core: bar validation, indicator battery, regime classification,
//! confidence scoring, decision gate, price levels.
//!
//! One evaluation is a pure function of `(BarSeries, EngineConfig)`:
//! - Market data providers deliver raw rows; the validator turns them into a
//!   clean, ascending, de-duplicated `BarSeries`
//! - The indicator battery reads the latest value of every requested
//!   indicator, with explicit unavailability instead of NaN
//! - Regime labels and six agreement predicates feed the confidence score
//! - The decision gate and level calculator produce the final `Signal`
//!
//! Market context (long averages, Aroon, A/D, candle and break-and-retest
//! labels) is reported alongside and never scored. Narration is a separate,
//! optional step that cannot alter the signal.

pub mod battery;
pub mod confidence;
pub mod config;
pub mod context;
pub mod data;
pub mod decision;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod levels;
pub mod narrative;
pub mod patterns;
pub mod regime;

pub use battery::{IndicatorBattery, IndicatorKind, IndicatorSnapshot};
pub use confidence::{ConfidenceBreakdown, ConfidenceScore, PredicateId, Verdict};
pub use config::{ConfigError, EngineConfig};
pub use context::MarketContext;
pub use domain::{Bar, BarSeries, Bias, PriceLevels, Signal};
pub use engine::{Analysis, SignalEngine};
pub use error::SignalError;
pub use indicators::{Reading, Unavailability};
pub use patterns::{BreakRetest, CandlePattern};
pub use regime::{MomentumStrength, RegimeLabels, Trend, VolumeFlow};
