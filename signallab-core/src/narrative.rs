//! Narrator boundary: a flat context for text generators, a rules-based
//! template narrator, and a fallback that never touches the signal.
//!
//! Narrators only produce prose. Bias and levels are decided before a
//! narrator runs and nothing here can change them.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::engine::Analysis;
use crate::indicators::Reading;

/// Text used when a narrator fails.
pub const FALLBACK_NARRATIVE: &str = "Narrative unavailable for this signal.";

pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("narrator unavailable: {0}")]
    Unavailable(String),

    #[error("narrator context is missing '{0}'")]
    MissingField(String),

    #[error("narrator rejected the request: {0}")]
    Rejected(String),
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Flat, ordered key → value view of one analysis.
///
/// Numbers are rounded to two decimals; unavailable readings are the text
/// `"unavailable"`. Levels appear only when the signal has them. Market
/// context (long averages, Aroon, A/D, `candle`, `break_retest`) is included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NarratorContext {
    fields: BTreeMap<String, Value>,
}

impl NarratorContext {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let mut ctx = Self::default();
        let signal = &analysis.signal;
        let snap = &analysis.snapshot;

        ctx.text("symbol", &signal.symbol);
        ctx.text("timestamp", &signal.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
        ctx.number("price", signal.price);
        ctx.text("bias", signal.bias.as_str());
        ctx.fields
            .insert("confidence".into(), Value::from(signal.confidence.value()));
        ctx.text("trend", signal.regime.trend.as_str());
        ctx.text("momentum", signal.regime.momentum.as_str());
        ctx.text("volume_flow", signal.regime.volume_flow.as_str());

        for (key, reading) in [
            ("ema_fast", snap.ema_fast),
            ("ema_slow", snap.ema_slow),
            ("sma_fast", snap.sma_fast),
            ("sma_slow", snap.sma_slow),
            ("rsi", snap.rsi),
            ("macd_line", snap.macd.line),
            ("macd_signal", snap.macd.signal),
            ("macd_histogram", snap.macd.histogram),
            ("stochastic_k", snap.stochastic.k),
            ("stochastic_d", snap.stochastic.d),
            ("cci", snap.cci),
            ("adx", snap.adx.adx),
            ("plus_di", snap.adx.plus_di),
            ("minus_di", snap.adx.minus_di),
            ("atr", snap.atr),
            ("bollinger_upper", snap.bollinger.upper),
            ("bollinger_middle", snap.bollinger.middle),
            ("bollinger_lower", snap.bollinger.lower),
            ("obv", snap.obv),
            ("cmf", snap.cmf),
        ] {
            ctx.reading(key, reading);
        }

        let market = &analysis.context;
        for (key, reading) in [
            ("ema_medium", market.ema_medium),
            ("ema_long", market.ema_long),
            ("sma_long", market.sma_long),
            ("aroon_up", market.aroon_up),
            ("aroon_down", market.aroon_down),
            ("accumulation_distribution", market.accumulation_distribution),
        ] {
            ctx.reading(key, reading);
        }
        ctx.text("candle", market.candle.as_str());
        ctx.text("break_retest", market.break_retest.as_str());

        if let Some(levels) = &signal.levels {
            ctx.number("entry", levels.entry);
            ctx.number("stop_loss", levels.stop_loss);
            ctx.number("take_profit_1", levels.take_profit_1);
            ctx.number("take_profit_2", levels.take_profit_2);
        }

        ctx
    }

    fn text(&mut self, key: &str, value: &str) {
        self.fields.insert(key.to_string(), Value::from(value));
    }

    fn number(&mut self, key: &str, value: f64) {
        let value = if value.is_finite() {
            Value::from(round2(value))
        } else {
            Value::from(UNAVAILABLE)
        };
        self.fields.insert(key.to_string(), value);
    }

    fn reading(&mut self, key: &str, reading: Reading) {
        match reading.value() {
            Some(v) => self.number(key, v),
            None => self.text(key, UNAVAILABLE),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Numeric field, `None` when missing or unavailable.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Turns a context into prose.
pub trait Narrator: Send + Sync {
    fn narrate(&self, context: &NarratorContext) -> Result<String, NarratorError>;
}

/// Rules-based per-indicator report with a market summary block.
#[derive(Debug, Clone)]
pub struct TemplateNarrator {
    pub rsi_bounds: (f64, f64),
    pub stochastic_bounds: (f64, f64),
    pub cci_band: f64,
    pub adx_strong: f64,
}

impl Default for TemplateNarrator {
    fn default() -> Self {
        Self {
            rsi_bounds: (30.0, 70.0),
            stochastic_bounds: (20.0, 80.0),
            cci_band: 100.0,
            adx_strong: 25.0,
        }
    }
}

fn zone(value: f64, (lower, upper): (f64, f64)) -> &'static str {
    if value < lower {
        "oversold"
    } else if value > upper {
        "overbought"
    } else {
        "neutral"
    }
}

fn fmt_field(ctx: &NarratorContext, key: &str) -> String {
    ctx.get_f64(key)
        .map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:.2}"))
}

impl Narrator for TemplateNarrator {
    fn narrate(&self, ctx: &NarratorContext) -> Result<String, NarratorError> {
        let require = |key: &str| {
            ctx.get_str(key)
                .ok_or_else(|| NarratorError::MissingField(key.to_string()))
        };
        let symbol = require("symbol")?;
        let trend = require("trend")?;
        let bias = require("bias")?;
        let price = ctx
            .get_f64("price")
            .ok_or_else(|| NarratorError::MissingField("price".into()))?;

        let mut lines: Vec<String> = Vec::new();
        lines.push(match trend {
            "bullish" => "Price is above both EMAs, fast above slow: bullish trend".to_string(),
            "bearish" => "Price is below both EMAs, fast below slow: bearish trend".to_string(),
            _ => "Price is between the EMAs: sideways market".to_string(),
        });

        if let Some(rsi) = ctx.get_f64("rsi") {
            lines.push(format!("RSI is {rsi:.2}: {}", zone(rsi, self.rsi_bounds)));
        }
        if let (Some(line), Some(signal)) = (ctx.get_f64("macd_line"), ctx.get_f64("macd_signal")) {
            let cross = if line > signal { "bullish" } else { "bearish" };
            lines.push(format!("MACD is {line:.2}, signal {signal:.2}: {cross} crossover"));
        }
        if let (Some(k), Some(d)) = (ctx.get_f64("stochastic_k"), ctx.get_f64("stochastic_d")) {
            lines.push(format!(
                "Stochastic K/D {k:.2}/{d:.2}: {}",
                zone(k, self.stochastic_bounds)
            ));
        }
        if let Some(cci) = ctx.get_f64("cci") {
            let label = if cci > self.cci_band {
                "bullish"
            } else if cci < -self.cci_band {
                "bearish"
            } else {
                "neutral"
            };
            lines.push(format!("CCI is {cci:.2}: {label}"));
        }
        if let Some(adx) = ctx.get_f64("adx") {
            let label = if adx >= self.adx_strong { "strong" } else { "weak" };
            lines.push(format!("ADX is {adx:.2}: {label} trend"));
        }
        if let Some(atr) = ctx.get_f64("atr") {
            lines.push(format!("ATR is {atr:.2}"));
        }
        match ctx.get_f64("cmf") {
            Some(cmf) => {
                let flow = if cmf > 0.0 { "positive" } else { "negative" };
                lines.push(format!(
                    "OBV {}, CMF {cmf:.2}: {flow} flow",
                    fmt_field(ctx, "obv")
                ));
            }
            None => lines.push("Volume flow unavailable".to_string()),
        }
        if let (Some(upper), Some(lower)) =
            (ctx.get_f64("bollinger_upper"), ctx.get_f64("bollinger_lower"))
        {
            let position = if price > upper {
                "above"
            } else if price < lower {
                "below"
            } else {
                "within"
            };
            lines.push(format!("Price is {position} the Bollinger Bands"));
        }
        if let Some(ema_long) = ctx.get_f64("ema_long") {
            let side = if price >= ema_long { "above" } else { "below" };
            lines.push(format!("Price is {side} the long EMA ({ema_long:.2})"));
        }
        if let (Some(up), Some(down)) = (ctx.get_f64("aroon_up"), ctx.get_f64("aroon_down")) {
            let label = if up > down {
                "bullish"
            } else if up < down {
                "bearish"
            } else {
                "neutral"
            };
            lines.push(format!("Aroon up/down {up:.2}/{down:.2}: {label}"));
        }
        if let Some(ad) = ctx.get_f64("accumulation_distribution") {
            lines.push(format!("Accumulation/Distribution is {ad:.2}"));
        }
        let candle = ctx.get_str("candle").unwrap_or("normal");
        if candle != "normal" {
            lines.push(format!("Last candle: {}", candle.replace('_', " ")));
        }
        let break_retest = ctx.get_str("break_retest").unwrap_or("none");
        match break_retest {
            "bullish_retest" => lines.push("Bullish break and retest of the recent high".to_string()),
            "bearish_retest" => lines.push("Bearish break and retest of the recent low".to_string()),
            _ => {}
        }

        let mut out = format!("{symbol}\n");
        for line in &lines {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!(
            "\nMarket summary\nTrend: {trend}\nMomentum: {}\nVolatility: ATR = {}\nVolume: {}\nPrice action: {}, {}\n\nBias: {bias} (confidence {})\n",
            ctx.get_str("momentum").unwrap_or(UNAVAILABLE),
            fmt_field(ctx, "atr"),
            ctx.get_str("volume_flow").unwrap_or(UNAVAILABLE),
            candle.replace('_', " "),
            break_retest.replace('_', " "),
            ctx.get("confidence").map_or_else(|| UNAVAILABLE.to_string(), Value::to_string),
        ));
        if ctx.get("entry").is_some() {
            out.push_str(&format!(
                "Entry: {}\nStop loss: {}\nTake profit 1: {}\nTake profit 2: {}\n",
                fmt_field(ctx, "entry"),
                fmt_field(ctx, "stop_loss"),
                fmt_field(ctx, "take_profit_1"),
                fmt_field(ctx, "take_profit_2"),
            ));
        }
        Ok(out)
    }
}

/// Narrate, or return [`FALLBACK_NARRATIVE`] and log the failure.
pub fn narrate_or_fallback(narrator: &dyn Narrator, context: &NarratorContext) -> String {
    match narrator.narrate(context) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                symbol = context.get_str("symbol").unwrap_or_default(),
                error = %err,
                "narrator failed, using placeholder"
            );
            FALLBACK_NARRATIVE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::BarSeries;
    use crate::engine::SignalEngine;
    use crate::indicators::make_bars;

    fn analysis(threshold: u8) -> Analysis {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = BarSeries::from_validated("RAMP".into(), make_bars(&closes));
        SignalEngine::new(EngineConfig::default().with_threshold(threshold))
            .unwrap()
            .evaluate(&series)
            .unwrap()
    }

    struct Failing;

    impl Narrator for Failing {
        fn narrate(&self, _: &NarratorContext) -> Result<String, NarratorError> {
            Err(NarratorError::Unavailable("timeout".into()))
        }
    }

    #[test]
    fn context_rounds_and_flattens() {
        let a = analysis(7);
        let ctx = NarratorContext::from_analysis(&a);
        assert_eq!(ctx.get_str("bias"), Some("BUY"));
        assert_eq!(ctx.get_str("trend"), Some("bullish"));
        assert_eq!(ctx.get_f64("price"), Some(159.0));
        let atr = ctx.get_f64("atr").unwrap();
        assert_eq!(atr, (atr * 100.0).round() / 100.0);
        assert!(ctx.get("stop_loss").is_some());
    }

    #[test]
    fn context_marks_unavailable_and_omits_levels_for_hold() {
        let a = analysis(10);
        let ctx = NarratorContext::from_analysis(&a);
        assert_eq!(ctx.get_str("bias"), Some("HOLD"));
        assert!(ctx.get("entry").is_none());

        let mut a = analysis(10);
        a.snapshot.cmf = Reading::Unavailable(crate::indicators::Unavailability::MissingVolume);
        let ctx = NarratorContext::from_analysis(&a);
        assert_eq!(ctx.get_str("cmf"), Some(UNAVAILABLE));
        assert_eq!(ctx.get_f64("cmf"), None);
    }

    #[test]
    fn template_report_has_summary_and_levels() {
        let ctx = NarratorContext::from_analysis(&analysis(7));
        let text = TemplateNarrator::default().narrate(&ctx).unwrap();
        assert!(text.starts_with("RAMP\n"));
        assert!(text.contains("bullish trend"));
        assert!(text.contains("RSI is 100.00: overbought"));
        assert!(text.contains("bullish crossover"));
        assert!(text.contains("Bias: BUY (confidence 7)"));
        assert!(text.contains("Stop loss:"));
    }

    #[test]
    fn context_carries_market_context() {
        let ctx = NarratorContext::from_analysis(&analysis(7));
        assert_eq!(ctx.get_str("candle"), Some("normal"));
        assert_eq!(ctx.get_str("break_retest"), Some("none"));
        // 60 bars: EMA(50) is there, the 200-bar averages are not.
        assert!(ctx.get_f64("ema_medium").is_some());
        assert_eq!(ctx.get_str("ema_long"), Some(UNAVAILABLE));
        assert_eq!(ctx.get_str("sma_long"), Some(UNAVAILABLE));
        assert_eq!(ctx.get_f64("aroon_up"), Some(100.0));
        assert!(ctx.get_f64("accumulation_distribution").is_some());
    }

    #[test]
    fn template_reports_price_action() {
        let mut a = analysis(7);
        a.context.candle = crate::patterns::CandlePattern::BearishPinBar;
        a.context.break_retest = crate::patterns::BreakRetest::BullishRetest;
        let text = TemplateNarrator::default()
            .narrate(&NarratorContext::from_analysis(&a))
            .unwrap();
        assert!(text.contains("- Last candle: bearish pin bar\n"));
        assert!(text.contains("- Bullish break and retest of the recent high\n"));
        assert!(text.contains("Price action: bearish pin bar, bullish retest\n"));
        assert!(text.contains("Aroon up/down 100.00/0.00: bullish"));
        assert!(!text.contains("long EMA"));
    }

    #[test]
    fn template_needs_core_fields() {
        let err = TemplateNarrator::default()
            .narrate(&NarratorContext::default())
            .unwrap_err();
        assert!(matches!(err, NarratorError::MissingField(_)));
    }

    #[test]
    fn fallback_leaves_signal_alone() {
        let a = analysis(7);
        let before = a.signal.clone();
        let ctx = NarratorContext::from_analysis(&a);
        assert_eq!(narrate_or_fallback(&Failing, &ctx), FALLBACK_NARRATIVE);
        assert_eq!(a.signal, before);
    }
}
