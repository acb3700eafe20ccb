//! MACD: Moving Average Convergence/Divergence.
//!
//! line = EMA(fast) - EMA(slow)
//! signal = EMA(signal_period) of the line, seeded with its first defined value
//! histogram = line - signal
//!
//! Lookback: line max(fast, slow) - 1; signal and histogram add signal_period - 1.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD outputs over the full series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD from precomputed fast and slow EMAs of the same series.
pub fn macd_from_emas(fast: &[f64], slow: &[f64], signal_period: usize) -> MacdSeries {
    let line: Vec<f64> = fast.iter().zip(slow).map(|(f, s)| f - s).collect();
    let signal = ema_of_series(&line, signal_period);
    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
    MacdSeries {
        line,
        signal,
        histogram,
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        let (fast, slow, signal) = (fast.max(1), slow.max(1), signal.max(1));
        let suffix = match output {
            MacdLine::Line => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "histogram",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{suffix}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line_lookback(&self) -> usize {
        self.fast.max(self.slow) - 1
    }

    /// Compute all three outputs at once.
    pub fn series(&self, bars: &[Bar]) -> MacdSeries {
        let closes = closes(bars);
        macd_from_emas(
            &ema_of_series(&closes, self.fast),
            &ema_of_series(&closes, self.slow),
            self.signal,
        )
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdLine::Line => self.line_lookback(),
            MacdLine::Signal | MacdLine::Histogram => self.line_lookback() + self.signal - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let series = self.series(bars);
        match self.output {
            MacdLine::Line => series.line,
            MacdLine::Signal => series.signal,
            MacdLine::Histogram => series.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn ramp(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn macd_warmup_lengths() {
        let bars = ramp(40);
        let line = Macd::new(12, 26, 9, MacdLine::Line).compute(&bars);
        let signal = Macd::new(12, 26, 9, MacdLine::Signal).compute(&bars);
        assert!(line[24].is_nan());
        assert!(!line[25].is_nan());
        assert!(signal[32].is_nan());
        assert!(!signal[33].is_nan());
        assert_eq!(Macd::new(12, 26, 9, MacdLine::Signal).lookback(), 33);
    }

    #[test]
    fn rising_series_line_above_signal() {
        let bars = ramp(60);
        let s = Macd::new(12, 26, 9, MacdLine::Line).series(&bars);
        let last = bars.len() - 1;
        assert!(s.line[last] > 0.0);
        assert!(s.line[last] > s.signal[last]);
        assert!(s.histogram[last] > 0.0);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes = [10.0, 11.0, 10.5, 12.0, 13.0, 12.5, 14.0, 15.0, 14.0, 16.0];
        let bars = make_bars(&closes);
        let s = Macd::new(2, 4, 3, MacdLine::Histogram).series(&bars);
        for i in 0..closes.len() {
            if !s.histogram[i].is_nan() {
                assert_approx(s.histogram[i], s.line[i] - s.signal[i], DEFAULT_EPSILON);
            }
        }
    }

    #[test]
    fn reference_values_3_6_3() {
        // Closes of a choppy 10-bar tape; EMA(3) and EMA(6) both seeded with 102.
        let closes = [102.0, 106.0, 99.0, 101.0, 105.0, 108.0, 110.0, 105.0, 107.0, 112.0];
        let s = Macd::new(3, 6, 3, MacdLine::Line).series(&make_bars(&closes));
        assert!(s.line[4].is_nan());
        assert!(s.signal[6].is_nan());

        let eps = 1e-9;
        assert_approx(s.line[5], 1.3966167370738383, eps);
        assert_approx(s.line[6], 1.9484762407670273, eps);
        assert_approx(s.line[9], 16900777647.0 / 10330523392.0, eps);
        // Signal is seeded with line[5] and reported from index 7.
        assert_approx(s.signal[7], 1.2341665447341548, eps);
        assert_approx(s.signal[8], 0.9665829511341761, eps);
        assert_approx(s.signal[9], 13443042717.0 / 10330523392.0, eps);
        assert_approx(s.histogram[7], -0.43837994418627807, eps);
        assert_approx(s.histogram[9], 0.33471052712369675, eps);
    }

    #[test]
    fn flat_series_is_zero() {
        let bars = make_bars(&[50.0; 40]);
        let s = Macd::new(12, 26, 9, MacdLine::Line).series(&bars);
        assert_approx(s.line[39], 0.0, DEFAULT_EPSILON);
        assert_approx(s.signal[39], 0.0, DEFAULT_EPSILON);
    }
}
