//! Bollinger Bands: moving average ± standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses population stddev (divide by N). A flat window collapses all three
//! bands onto the middle.
//! Lookback: period - 1.

use super::sma::sma_of_series;
use super::{closes, Indicator};
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        let period = period.max(1);
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}"),
        }
    }

    /// All three bands in one pass.
    pub fn series(&self, bars: &[Bar]) -> BollingerSeries {
        let closes = closes(bars);
        let middle = sma_of_series(&closes, self.period);
        let n = closes.len();
        let mut upper = vec![f64::NAN; n];
        let mut lower = vec![f64::NAN; n];

        for i in 0..n {
            let mean = middle[i];
            if mean.is_nan() {
                continue;
            }
            let window = &closes[i + 1 - self.period..=i];
            let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>()
                / self.period as f64;
            let width = self.multiplier * variance.sqrt();
            upper[i] = mean + width;
            lower[i] = mean - width;
        }

        BollingerSeries {
            upper,
            middle,
            lower,
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let series = self.series(bars);
        match self.band {
            BollingerBand::Upper => series.upper,
            BollingerBand::Middle => series.middle,
            BollingerBand::Lower => series.lower,
        }
    }
}
