//! Market context reported next to the signal: long-horizon averages, Aroon,
//! the accumulation/distribution line, and price-action labels.
//!
//! Computed from the same validated series as the battery, but nothing here
//! feeds regime classification, confidence scoring or the decision gate.

use serde::{Deserialize, Serialize};

use crate::config::ContextWindows;
use crate::domain::BarSeries;
use crate::indicators::{
    AccumulationDistribution, Aroon, Ema, Indicator, Reading, Sma, Unavailability,
};
use crate::patterns::{BreakRetest, CandlePattern};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub ema_medium: Reading,
    pub ema_long: Reading,
    pub sma_long: Reading,
    pub aroon_up: Reading,
    pub aroon_down: Reading,
    pub accumulation_distribution: Reading,
    /// Shape of the latest candle.
    pub candle: CandlePattern,
    pub break_retest: BreakRetest,
}

fn latest(indicator: &dyn Indicator, series: &BarSeries) -> Reading {
    Reading::at_end(&indicator.compute(series.bars()), indicator.lookback())
}

impl MarketContext {
    pub fn compute(series: &BarSeries, windows: &ContextWindows) -> Self {
        let bars = series.bars();
        let full_volume = !bars.is_empty() && bars.iter().all(|b| b.volume.is_some());
        let accumulation_distribution = if full_volume {
            latest(&AccumulationDistribution::new(), series)
        } else {
            Reading::Unavailable(Unavailability::MissingVolume)
        };

        Self {
            ema_medium: latest(&Ema::new(windows.ema_medium), series),
            ema_long: latest(&Ema::new(windows.ema_long), series),
            sma_long: latest(&Sma::new(windows.sma_long), series),
            aroon_up: latest(&Aroon::up(windows.aroon), series),
            aroon_down: latest(&Aroon::down(windows.aroon), series),
            accumulation_distribution,
            candle: series
                .last()
                .map_or(CandlePattern::Normal, CandlePattern::classify),
            break_retest: BreakRetest::detect(bars, windows.break_retest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn ramp(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        BarSeries::from_validated("RAMP".to_string(), make_bars(&closes))
    }

    #[test]
    fn long_windows_unavailable_on_short_history() {
        let ctx = MarketContext::compute(&ramp(100), &ContextWindows::default());
        assert!(ctx.ema_medium.is_available());
        let insufficient = Reading::Unavailable(Unavailability::InsufficientHistory);
        assert_eq!(ctx.ema_long, insufficient);
        assert_eq!(ctx.sma_long, insufficient);
    }

    #[test]
    fn ramp_context() {
        let ctx = MarketContext::compute(&ramp(240), &ContextWindows::default());
        assert!(ctx.ema_long.is_available());
        // Mean of closes 140..=339.
        assert!((ctx.sma_long.value().unwrap() - 239.5).abs() < 1e-9);
        assert_eq!(ctx.aroon_up, Reading::Value(100.0));
        assert_eq!(ctx.aroon_down, Reading::Value(0.0));
        // Every ramp bar closes in the upper third of its range: positive flow.
        assert!(ctx.accumulation_distribution.value().unwrap() > 0.0);
        assert_eq!(ctx.break_retest, BreakRetest::None);
    }

    #[test]
    fn missing_volume_blanks_accumulation_distribution() {
        let mut bars = make_bars(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        bars[10].volume = None;
        let series = BarSeries::from_validated("GAP".to_string(), bars);
        let ctx = MarketContext::compute(&series, &ContextWindows::default());
        assert_eq!(
            ctx.accumulation_distribution,
            Reading::Unavailable(Unavailability::MissingVolume)
        );
        assert!(ctx.aroon_up.is_available());
    }
}
