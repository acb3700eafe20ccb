//! Chaikin Money Flow (CMF).
//!
//! MFM = ((close - low) - (high - close)) / (high - low), 0 when high == low
//! CMF = sum(MFM * volume) / sum(volume) over the window
//! A window with any bar lacking volume, or with zero total volume, is NaN.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Cmf {
    period: usize,
    name: String,
}

impl Cmf {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("cmf_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

pub(crate) fn money_flow_multiplier(bar: &Bar) -> f64 {
    let range = bar.high - bar.low;
    if range > 0.0 {
        ((bar.close - bar.low) - (bar.high - bar.close)) / range
    } else {
        0.0
    }
}

impl Indicator for Cmf {
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

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            let mut flow = 0.0;
            let mut volume = 0.0;
            let complete = window.iter().all(|bar| match bar.volume {
                Some(v) => {
                    flow += money_flow_multiplier(bar) * v;
                    volume += v;
                    true
                }
                None => false,
            });
            if complete && volume > 0.0 {
                result[i] = flow / volume;
            }
        }

        result
    }
}
