//! On-Balance Volume (OBV).
//!
//! OBV[0] = 0; OBV[t] = OBV[t-1] + sign(close[t] - close[t-1]) * volume[t].
//! Needs volume on every bar: the first bar without volume makes it and all
//! later values NaN.
//! Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Obv {
    name: String,
}

impl Obv {
    pub fn new() -> Self {
        Self {
            name: "obv".to_string(),
        }
    }
}

impl Default for Obv {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        let Some(first) = bars.first() else {
            return result;
        };
        if first.volume.is_none() {
            return result;
        }
        result[0] = 0.0;

        let mut obv = 0.0;
        for (i, pair) in bars.windows(2).enumerate() {
            let Some(volume) = pair[1].volume else {
                return result;
            };
            let change = pair[1].close - pair[0].close;
            if change > 0.0 {
                obv += volume;
            } else if change < 0.0 {
                obv -= volume;
            }
            result[i + 1] = obv;
        }

        result
    }
}
