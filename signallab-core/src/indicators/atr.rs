//! Average True Range (ATR) and the shared Wilder helpers.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar has no previous close, so its TR is NaN.
//! ATR: Wilder smoothing of TR (alpha = 1/period), seeded with the mean of
//! TR over bars 1..=period.
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. `tr[0]` is NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, bar) = (&pair[0], &pair[1]);
        let pc = prev.close;
        tr[i + 1] = (bar.high - bar.low)
            .max((bar.high - pc).abs())
            .max((bar.low - pc).abs());
    }
    tr
}

/// Wilder smoothing, alpha = 1/period.
///
/// Seeded with the mean of the first run of `period` consecutive defined
/// values; the seed lands on the last index of that run. A NaN after the
/// seed taints the rest of the output.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let Some(seed_start) = (0..=n - period)
        .find(|&s| values[s..s + period].iter().all(|v| !v.is_nan()))
    else {
        return result;
    };
    let seed_end = seed_start + period;

    let mut prev = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

/// ATR from a precomputed true range series.
pub fn atr_from_true_range(tr: &[f64], period: usize) -> Vec<f64> {
    wilder_smooth(tr, period)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        atr_from_true_range(&true_range(bars), self.period)
    }
}
