//! Accumulation/Distribution line.
//!
//! A/D[t] = A/D[t-1] + MFM[t] * volume[t], starting from MFM[0] * volume[0],
//! with the same money-flow multiplier as CMF (0 when high == low).
//! Every bar from the first one on must carry volume; the series is NaN from
//! the first missing volume onward.
//! Lookback: 0.

use super::cmf::money_flow_multiplier;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct AccumulationDistribution;

impl AccumulationDistribution {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for AccumulationDistribution {
    fn name(&self) -> &str {
        "accumulation_distribution"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        let mut line = 0.0;
        for (i, bar) in bars.iter().enumerate() {
            let Some(volume) = bar.volume else {
                break;
            };
            line += money_flow_multiplier(bar) * volume;
            result[i] = line;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv_bars, DEFAULT_EPSILON};

    #[test]
    fn accumulates_signed_flow() {
        let bars = make_ohlcv_bars(&[
            (10.0, 12.0, 8.0, 12.0, Some(100.0)), // MFM  1   → 100
            (10.0, 12.0, 8.0, 8.0, Some(300.0)),  // MFM -1   → -200
            (10.0, 12.0, 8.0, 11.0, Some(200.0)), // MFM 0.5  → -100
            (10.0, 10.0, 10.0, 10.0, Some(50.0)), // flat bar → -100
        ]);
        let ad = AccumulationDistribution::new().compute(&bars);
        assert_approx(ad[0], 100.0, DEFAULT_EPSILON);
        assert_approx(ad[1], -200.0, DEFAULT_EPSILON);
        assert_approx(ad[2], -100.0, DEFAULT_EPSILON);
        assert_approx(ad[3], -100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn missing_volume_stops_the_line() {
        let bars = make_ohlcv_bars(&[
            (10.0, 12.0, 8.0, 12.0, Some(100.0)),
            (10.0, 12.0, 8.0, 12.0, None),
            (10.0, 12.0, 8.0, 12.0, Some(100.0)),
        ]);
        let ad = AccumulationDistribution::new().compute(&bars);
        assert_approx(ad[0], 100.0, DEFAULT_EPSILON);
        assert!(ad[1].is_nan());
        assert!(ad[2].is_nan());
    }
}
