//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: EMA[0] = close[0]; the recursion runs from the first bar but values
//! are reported only from index period-1.
//! Lookback: period - 1.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.period)
    }
}

/// EMA of an arbitrary series.
///
/// Leading NaNs are skipped: the recursion is seeded with the first defined
/// value at index `s` and reported from `s + period - 1`. A NaN after the
/// seed taints the rest of the output. Used by MACD for the signal line.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let report_from = start + period - 1;
    let mut prev = values[start];

    for i in start..n {
        if values[i].is_nan() {
            return result;
        }
        if i > start {
            prev = alpha * values[i] + (1.0 - alpha) * prev;
        }
        if i >= report_from {
            result[i] = prev;
        }
    }

    result
}
