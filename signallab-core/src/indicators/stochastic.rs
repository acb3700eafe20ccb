//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k))
//! %D = SMA(d) of %K
//! A window whose high equals its low has no %K (NaN), and every %D window
//! touching it is NaN too.
//! Lookback: %K k - 1, %D k + d - 2.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, line: StochasticLine) -> Self {
        let (k_period, d_period) = (k_period.max(1), d_period.max(1));
        let name = match line {
            StochasticLine::K => format!("stoch_k_{k_period}"),
            StochasticLine::D => format!("stoch_d_{k_period}_{d_period}"),
        };
        Self {
            k_period,
            d_period,
            line,
            name,
        }
    }

    /// (%K, %D) over the full series.
    pub fn series(&self, bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
        let k = percent_k(bars, self.k_period);
        let d = sma_of_series(&k, self.d_period);
        (k, d)
    }
}

fn percent_k(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let hh = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let ll = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let range = hh - ll;
        if range > 0.0 {
            result[i] = 100.0 * (bars[i].close - ll) / range;
        }
    }

    result
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.k_period - 1,
            StochasticLine::D => self.k_period + self.d_period - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (k, d) = self.series(bars);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlcv_bars, DEFAULT_EPSILON};

    #[test]
    fn known_values() {
        // k = 3, d = 2
        let bars = make_ohlcv_bars(&[
            (10.0, 12.0, 9.0, 11.0, None),
            (11.0, 13.0, 10.0, 12.0, None),
            (12.0, 14.0, 11.0, 13.0, None), // HH 14, LL 9 → 100*(13-9)/5 = 80
            (13.0, 13.5, 10.0, 11.0, None), // HH 14, LL 10 → 100*(11-10)/4 = 25
        ]);
        let (k, d) = Stochastic::new(3, 2, StochasticLine::K).series(&bars);
        assert!(k[1].is_nan());
        assert_approx(k[2], 80.0, DEFAULT_EPSILON);
        assert_approx(k[3], 25.0, DEFAULT_EPSILON);
        assert!(d[2].is_nan());
        assert_approx(d[3], 52.5, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_range_is_undefined() {
        let bars = make_ohlcv_bars(&[(100.0, 100.0, 100.0, 100.0, None); 5]);
        let (k, d) = Stochastic::new(3, 2, StochasticLine::K).series(&bars);
        assert!(k.iter().all(|v| v.is_nan()));
        assert!(d.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lookbacks() {
        assert_eq!(Stochastic::new(14, 3, StochasticLine::K).lookback(), 13);
        assert_eq!(Stochastic::new(14, 3, StochasticLine::D).lookback(), 15);
    }
}
