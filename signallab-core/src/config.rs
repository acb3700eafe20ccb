//! Engine configuration.
//!
//! One immutable `EngineConfig` is handed to [`crate::engine::SignalEngine`]
//! at construction. It is plain data, loadable from TOML, with defaults that
//! reproduce the conventional indicator settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("window '{name}' must be >= 1")]
    ZeroWindow { name: &'static str },

    #[error("MACD fast window ({fast}) must be shorter than slow window ({slow})")]
    MacdWindows { fast: usize, slow: usize },

    #[error("EMA fast window ({fast}) must be shorter than slow window ({slow})")]
    EmaWindows { fast: usize, slow: usize },

    #[error("confidence threshold {0} is outside 0..=10")]
    Threshold(u8),

    #[error("minimum_bars must be >= 1")]
    MinimumBars,

    #[error("invalid band {name}: lower {lower} must be below upper {upper}")]
    Band {
        name: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error(
        "ATR multipliers must satisfy 0 < stop_loss < take_profit_1 < take_profit_2 \
         (got {stop_loss} / {take_profit_1} / {take_profit_2})"
    )]
    Multipliers {
        stop_loss: f64,
        take_profit_1: f64,
        take_profit_2: f64,
    },

    #[error("{name} must be finite and positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },
}

/// Indicator window lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub cci: usize,
    pub adx: usize,
    pub atr: usize,
    pub bollinger: usize,
    pub bollinger_k: f64,
    pub cmf: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 26,
            sma_fast: 20,
            sma_slow: 50,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stochastic_k: 14,
            stochastic_d: 3,
            cci: 20,
            adx: 14,
            atr: 14,
            bollinger: 20,
            bollinger_k: 2.0,
            cmf: 20,
        }
    }
}

impl IndicatorWindows {
    /// Bars needed before every indicator in the battery has a value.
    ///
    /// This is the default minimum series length (50 with default windows,
    /// driven by SMA(50)).
    pub fn required_bars(&self) -> usize {
        [
            self.ema_fast,
            self.ema_slow,
            self.sma_fast,
            self.sma_slow,
            self.rsi + 1,
            self.macd_fast.max(self.macd_slow) + self.macd_signal - 1,
            self.stochastic_k + self.stochastic_d - 1,
            self.cci,
            2 * self.adx,
            self.atr + 1,
            self.bollinger,
            self.cmf,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("rsi", self.rsi),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("stochastic_k", self.stochastic_k),
            ("stochastic_d", self.stochastic_d),
            ("cci", self.cci),
            ("adx", self.adx),
            ("atr", self.atr),
            ("bollinger", self.bollinger),
            ("cmf", self.cmf),
        ];
        if let Some(&(name, _)) = named.iter().find(|(_, w)| *w == 0) {
            return Err(ConfigError::ZeroWindow { name });
        }
        if self.ema_fast >= self.ema_slow {
            return Err(ConfigError::EmaWindows {
                fast: self.ema_fast,
                slow: self.ema_slow,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdWindows {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if !(self.bollinger_k.is_finite() && self.bollinger_k > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "bollinger_k",
                value: self.bollinger_k,
            });
        }
        Ok(())
    }
}

/// Windows for the market-context readings shown next to the signal.
///
/// These never feed scoring and do not raise the minimum series length: with
/// fewer bars than a window the reading is simply unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWindows {
    pub ema_medium: usize,
    pub ema_long: usize,
    pub sma_long: usize,
    pub aroon: usize,
    /// Bars before the breakout bar that define the level being broken.
    pub break_retest: usize,
}

impl Default for ContextWindows {
    fn default() -> Self {
        Self {
            ema_medium: 50,
            ema_long: 200,
            sma_long: 200,
            aroon: 25,
            break_retest: 10,
        }
    }
}

impl ContextWindows {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("ema_medium", self.ema_medium),
            ("ema_long", self.ema_long),
            ("sma_long", self.sma_long),
            ("aroon", self.aroon),
            ("break_retest", self.break_retest),
        ];
        match named.iter().find(|(_, w)| *w == 0) {
            Some(&(name, _)) => Err(ConfigError::ZeroWindow { name }),
            None => Ok(()),
        }
    }
}

/// Thresholds read by the regime classifier and the confidence predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    /// ADX at or above this marks a strong trend.
    pub adx_strong: f64,
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    pub stochastic_lower: f64,
    pub stochastic_upper: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            adx_strong: 25.0,
            rsi_lower: 30.0,
            rsi_upper: 70.0,
            stochastic_lower: 20.0,
            stochastic_upper: 80.0,
        }
    }
}

impl ScoringThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.adx_strong.is_finite() && self.adx_strong > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "adx_strong",
                value: self.adx_strong,
            });
        }
        for (name, lower, upper) in [
            ("rsi", self.rsi_lower, self.rsi_upper),
            ("stochastic", self.stochastic_lower, self.stochastic_upper),
        ] {
            if !(lower.is_finite() && upper.is_finite() && lower < upper) {
                return Err(ConfigError::Band { name, lower, upper });
            }
        }
        Ok(())
    }
}

/// ATR multipliers for stop-loss and the two take-profit targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelMultipliers {
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

impl Default for LevelMultipliers {
    fn default() -> Self {
        Self {
            stop_loss: 1.0,
            take_profit_1: 2.0,
            take_profit_2: 3.0,
        }
    }
}

impl LevelMultipliers {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.stop_loss > 0.0
            && self.stop_loss < self.take_profit_1
            && self.take_profit_1 < self.take_profit_2
            && self.take_profit_2.is_finite();
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::Multipliers {
                stop_loss: self.stop_loss,
                take_profit_1: self.take_profit_1,
                take_profit_2: self.take_profit_2,
            })
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub windows: IndicatorWindows,
    pub scoring: ScoringThresholds,
    /// Minimum confidence (0..=10) for a directional bias.
    pub confidence_threshold: u8,
    /// Minimum clean bars; `None` means [`IndicatorWindows::required_bars`].
    pub minimum_bars: Option<usize>,
    pub levels: LevelMultipliers,
    pub context: ContextWindows,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            windows: IndicatorWindows::default(),
            scoring: ScoringThresholds::default(),
            confidence_threshold: 8,
            minimum_bars: None,
            levels: LevelMultipliers::default(),
            context: ContextWindows::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.windows.validate()?;
        self.scoring.validate()?;
        self.levels.validate()?;
        self.context.validate()?;
        if self.confidence_threshold > 10 {
            return Err(ConfigError::Threshold(self.confidence_threshold));
        }
        if self.minimum_bars == Some(0) {
            return Err(ConfigError::MinimumBars);
        }
        Ok(())
    }

    /// Effective minimum series length.
    pub fn minimum_bars(&self) -> usize {
        self.minimum_bars
            .unwrap_or_else(|| self.windows.required_bars())
    }

    /// Builder-style override of the confidence threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Builder-style override of the minimum bar count.
    pub fn with_minimum_bars(mut self, minimum: usize) -> Self {
        self.minimum_bars = Some(minimum);
        self
    }
}
