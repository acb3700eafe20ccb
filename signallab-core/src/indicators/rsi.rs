//! Relative Strength Index (RSI), Wilder.
//!
//! Seed: mean gain and mean loss over the first `period` close-to-close
//! changes. Then Wilder smoothing with alpha = 1/period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: no losses → 100; no gains → 0; no movement at all → 50.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // changes[i] is the move into bar i + 1
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let split = |ch: f64| (ch.max(0.0), (-ch).max(0.0));

    let seed = &changes[..period];
    if seed.iter().any(|c| c.is_nan()) {
        return result;
    }
    let (mut avg_gain, mut avg_loss) = seed.iter().fold((0.0, 0.0), |(g, l), &ch| {
        let (gain, loss) = split(ch);
        (g + gain, l + loss)
    });
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for (offset, &ch) in changes[period..].iter().enumerate() {
        if ch.is_nan() {
            return result;
        }
        let (gain, loss) = split(ch);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result[period + 1 + offset] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}
