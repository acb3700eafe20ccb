//! Aroon: how recently the window saw its highest high and lowest low.
//!
//! Aroon Up = 100 * (period - bars_since_highest_high) / period
//! Aroon Down = 100 * (period - bars_since_lowest_low) / period
//! The window is the last `period + 1` bars; ties go to the most recent bar.
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AroonLine {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Aroon {
    period: usize,
    line: AroonLine,
    name: String,
}

impl Aroon {
    pub fn new(period: usize, line: AroonLine) -> Self {
        let period = period.max(1);
        let prefix = match line {
            AroonLine::Up => "aroon_up",
            AroonLine::Down => "aroon_down",
        };
        Self {
            period,
            line,
            name: format!("{prefix}_{period}"),
        }
    }

    pub fn up(period: usize) -> Self {
        Self::new(period, AroonLine::Up)
    }

    pub fn down(period: usize) -> Self {
        Self::new(period, AroonLine::Down)
    }
}

impl Indicator for Aroon {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        for i in self.period..n {
            let window = &bars[i - self.period..=i];
            let mut extreme_offset = 0;
            let mut extreme = match self.line {
                AroonLine::Up => f64::NEG_INFINITY,
                AroonLine::Down => f64::INFINITY,
            };
            for (j, bar) in window.iter().enumerate() {
                let newer_extreme = match self.line {
                    AroonLine::Up => bar.high >= extreme,
                    AroonLine::Down => bar.low <= extreme,
                };
                if newer_extreme {
                    extreme = match self.line {
                        AroonLine::Up => bar.high,
                        AroonLine::Down => bar.low,
                    };
                    extreme_offset = j;
                }
            }
            let bars_since = self.period - extreme_offset;
            result[i] = 100.0 * (self.period - bars_since) as f64 / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv_bars, DEFAULT_EPSILON};

    #[test]
    fn up_is_100_when_high_is_latest() {
        let bars = make_ohlcv_bars(&[
            (9.0, 10.0, 8.0, 9.5, None),
            (9.5, 11.0, 9.0, 10.5, None),
            (10.5, 12.0, 10.0, 11.5, None),
            (11.5, 13.0, 11.0, 12.5, None),
        ]);
        assert_approx(Aroon::up(3).compute(&bars)[3], 100.0, DEFAULT_EPSILON);
        // Lowest low is the oldest bar in the window.
        assert_approx(Aroon::down(3).compute(&bars)[3], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn partial_recency() {
        // Highest high two bars ago out of a 4-bar lookback: 100 * 2 / 4.
        let bars = make_ohlcv_bars(&[
            (10.0, 11.0, 9.0, 10.0, None),
            (10.0, 11.0, 9.0, 10.0, None),
            (10.0, 15.0, 9.0, 10.0, None),
            (10.0, 11.0, 9.0, 10.0, None),
            (10.0, 11.0, 9.0, 10.0, None),
        ]);
        assert_approx(Aroon::up(4).compute(&bars)[4], 50.0, DEFAULT_EPSILON);
        // Equal lows everywhere: the latest bar wins the tie.
        assert_approx(Aroon::down(4).compute(&bars)[4], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn warmup_and_name() {
        let bars = make_ohlcv_bars(&[(10.0, 11.0, 9.0, 10.0, None); 3]);
        let out = Aroon::up(3).compute(&bars);
        assert!(out.iter().all(|v| v.is_nan()));
        assert_eq!(Aroon::down(25).name(), "aroon_down_25");
        assert_eq!(Aroon::up(25).lookback(), 25);
    }
}
