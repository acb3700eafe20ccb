//! Signal engine: validated series → indicators → regime → confidence →
//! decision → levels → [`Signal`].
//!
//! The engine is a pure function of `(BarSeries, EngineConfig)`. It holds no
//! mutable state, so one engine can be shared across threads.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battery::{IndicatorBattery, IndicatorSnapshot};
use crate::confidence::{self, ConfidenceBreakdown};
use crate::config::EngineConfig;
use crate::context::MarketContext;
use crate::data::provider::{BarRequest, MarketDataProvider, RawBar};
use crate::data::validate::{validate_bars, ValidationReport};
use crate::decision::decide;
use crate::domain::{BarSeries, Signal};
use crate::error::SignalError;
use crate::indicators::IndicatorHistory;
use crate::levels::compute_levels;
use crate::regime::classify;

/// Everything one evaluation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub signal: Signal,
    pub snapshot: IndicatorSnapshot,
    pub breakdown: ConfidenceBreakdown,
    /// Unscored readings and price-action labels.
    pub context: MarketContext,
    pub report: ValidationReport,
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
    battery: IndicatorBattery,
}

impl SignalEngine {
    /// Engine with the full indicator battery.
    ///
    /// # Errors
    /// [`SignalError::Config`] when the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, SignalError> {
        config.validate()?;
        let battery = IndicatorBattery::new(config.windows.clone());
        Ok(Self { config, battery })
    }

    /// Engine with a caller-supplied (possibly restricted) battery.
    pub fn with_battery(config: EngineConfig, battery: IndicatorBattery) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config, battery })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate raw provider rows and evaluate them.
    pub fn analyze(&self, symbol: &str, raw: &[RawBar]) -> Result<Analysis, SignalError> {
        let (series, report) = validate_bars(symbol, raw, self.config.minimum_bars())?;
        let (snapshot, _) = self.run(&series, false);
        Ok(self.assemble(&series, snapshot, report))
    }

    /// Fetch from `provider`, then [`Self::analyze`]. Provider failures
    /// become [`SignalError::DataUnavailable`].
    pub fn fetch_and_analyze(
        &self,
        provider: &dyn MarketDataProvider,
        request: &BarRequest,
    ) -> Result<Analysis, SignalError> {
        let raw = provider
            .fetch(request)
            .map_err(|e| SignalError::data_unavailable(&request.symbol, &e))?;
        debug!(symbol = %request.symbol, provider = provider.name(), rows = raw.len(), "fetched");
        self.analyze(&request.symbol, &raw)
    }

    /// Evaluate an already validated series.
    ///
    /// # Errors
    /// [`SignalError::InsufficientData`] when the series is shorter than the
    /// configured minimum.
    pub fn evaluate(&self, series: &BarSeries) -> Result<Analysis, SignalError> {
        self.check_length(series)?;
        let (snapshot, _) = self.run(series, false);
        Ok(self.assemble(series, snapshot, Self::passthrough_report(series)))
    }

    /// [`Self::evaluate`] plus the full indicator series for charting.
    pub fn evaluate_with_history(
        &self,
        series: &BarSeries,
    ) -> Result<(Analysis, IndicatorHistory), SignalError> {
        self.check_length(series)?;
        let (snapshot, history) = self.run(series, true);
        let analysis = self.assemble(series, snapshot, Self::passthrough_report(series));
        Ok((analysis, history.unwrap_or_default()))
    }

    fn check_length(&self, series: &BarSeries) -> Result<(), SignalError> {
        let required = self.config.minimum_bars();
        if series.len() < required || series.is_empty() {
            return Err(SignalError::InsufficientData {
                symbol: series.symbol().to_string(),
                required,
                actual: series.len(),
            });
        }
        Ok(())
    }

    fn passthrough_report(series: &BarSeries) -> ValidationReport {
        ValidationReport {
            input_rows: series.len(),
            output_rows: series.len(),
            ..ValidationReport::default()
        }
    }

    fn run(&self, series: &BarSeries, with_history: bool) -> (IndicatorSnapshot, Option<IndicatorHistory>) {
        if with_history {
            let (snapshot, history) = self.battery.compute_with_history(series);
            (snapshot, Some(history))
        } else {
            (self.battery.compute(series), None)
        }
    }

    fn assemble(
        &self,
        series: &BarSeries,
        snapshot: IndicatorSnapshot,
        report: ValidationReport,
    ) -> Analysis {
        let regime = classify(&snapshot, &self.config.scoring);
        let breakdown = confidence::score(&snapshot, &regime, &self.config.scoring);
        let bias = decide(regime.trend, &breakdown, self.config.confidence_threshold);
        let levels = compute_levels(bias, snapshot.price, regime.volatility, &self.config.levels);
        let context = MarketContext::compute(series, &self.config.context);

        // Validated series are never empty; check_length/validate_bars enforce it.
        let timestamp = series.last().map(|b| b.timestamp).unwrap_or_default();

        debug!(
            symbol = series.symbol(),
            trend = regime.trend.as_str(),
            agree = breakdown.agree,
            evaluable = breakdown.evaluable,
            confidence = breakdown.score.value(),
            bias = bias.as_str(),
            "signal assembled"
        );

        Analysis {
            signal: Signal {
                symbol: series.symbol().to_string(),
                timestamp,
                price: snapshot.price,
                regime,
                confidence: breakdown.score,
                bias,
                levels,
            },
            snapshot,
            breakdown,
            context,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::domain::Bias;
    use crate::indicators::make_bars;

    fn ramp_series(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        BarSeries::from_validated("RAMP".to_string(), make_bars(&closes))
    }

    #[test]
    fn rejects_invalid_config() {
        let err = SignalEngine::new(EngineConfig::default().with_threshold(11)).unwrap_err();
        assert!(matches!(err, SignalError::Config(ConfigError::Threshold(11))));
    }

    #[test]
    fn evaluate_checks_minimum_length() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let err = engine.evaluate(&ramp_series(20)).unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientData {
                required: 50,
                actual: 20,
                ..
            }
        ));
    }

    #[test]
    fn ramp_is_bullish() {
        let engine = SignalEngine::new(EngineConfig::default().with_threshold(7)).unwrap();
        let analysis = engine.evaluate(&ramp_series(60)).unwrap();
        assert_eq!(analysis.signal.bias, Bias::Buy);
        assert_eq!(analysis.signal.price, 159.0);
        assert!(analysis.signal.levels.is_some());
        assert_eq!(analysis.report.output_rows, 60);
    }

    #[test]
    fn history_variant_matches_plain_evaluate() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let series = ramp_series(60);
        let (with_history, history) = engine.evaluate_with_history(&series).unwrap();
        assert_eq!(with_history, engine.evaluate(&series).unwrap());
        assert!(history.get_series("ema_12").is_some());
    }

    #[test]
    fn context_never_moves_the_signal() {
        let series = ramp_series(60);
        let plain = SignalEngine::new(EngineConfig::default().with_threshold(7)).unwrap();
        let mut config = EngineConfig::default().with_threshold(7);
        config.context.ema_medium = 5;
        config.context.aroon = 3;
        config.context.break_retest = 2;
        let tweaked = SignalEngine::new(config).unwrap();

        let a = plain.evaluate(&series).unwrap();
        let b = tweaked.evaluate(&series).unwrap();
        assert_ne!(a.context, b.context);
        assert_eq!(a.signal.fingerprint(), b.signal.fingerprint());
        assert_eq!(a.breakdown, b.breakdown);
    }
}
