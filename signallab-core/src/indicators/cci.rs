//! Commodity Channel Index (CCI).
//!
//! TP = (high + low + close) / 3
//! CCI = (TP - SMA(TP)) / (0.015 * mean absolute deviation of TP)
//! Zero mean deviation (flat window) has no CCI.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

const LAMBERT: f64 = 0.015;

#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
    name: String,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("cci_{period}"),
        }
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let tp: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
        let p = self.period as f64;

        for i in (self.period - 1)..n {
            let window = &tp[i + 1 - self.period..=i];
            let mean = window.iter().sum::<f64>() / p;
            let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / p;
            if mean_dev > 0.0 {
                result[i] = (tp[i] - mean) / (LAMBERT * mean_dev);
            }
        }

        result
    }
}
