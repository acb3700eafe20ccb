//! ADX: Average Directional Index (Wilder), with +DI and -DI.
//!
//! Steps:
//! 1. +DM / −DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, −DM and TR over `period`
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), likewise −DI
//! 4. DX = 100 * |+DI − −DI| / (+DI + −DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! Zero smoothed TR or zero DI sum leaves DX undefined (NaN).
//! Lookback: DI period; ADX 2 * period - 1.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxLine {
    Adx,
    PlusDi,
    MinusDi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// ADX and both DI lines from bars and their precomputed true range.
pub fn adx_from_true_range(bars: &[Bar], tr: &[f64], period: usize) -> AdxSeries {
    let n = bars.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for (i, pair) in bars.windows(2).enumerate() {
        let up = pair[1].high - pair[0].high;
        let down = pair[0].low - pair[1].low;
        plus_dm[i + 1] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i + 1] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    let smooth_tr = wilder_smooth(tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];

    for i in 0..n {
        let str_ = smooth_tr[i];
        if str_.is_nan() || str_ <= 0.0 || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
            continue;
        }
        let p = 100.0 * smooth_plus[i] / str_;
        let m = 100.0 * smooth_minus[i] / str_;
        plus_di[i] = p;
        minus_di[i] = m;
        if p + m > 0.0 {
            dx[i] = 100.0 * (p - m).abs() / (p + m);
        }
    }

    AdxSeries {
        adx: wilder_smooth(&dx, period),
        plus_di,
        minus_di,
    }
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: AdxLine,
    name: String,
}

impl Adx {
    pub fn new(period: usize, line: AdxLine) -> Self {
        let period = period.max(1);
        let prefix = match line {
            AdxLine::Adx => "adx",
            AdxLine::PlusDi => "plus_di",
            AdxLine::MinusDi => "minus_di",
        };
        Self {
            period,
            line,
            name: format!("{prefix}_{period}"),
        }
    }

    pub fn series(&self, bars: &[Bar]) -> AdxSeries {
        adx_from_true_range(bars, &true_range(bars), self.period)
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            AdxLine::Adx => 2 * self.period - 1,
            AdxLine::PlusDi | AdxLine::MinusDi => self.period,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let series = self.series(bars);
        match self.line {
            AdxLine::Adx => series.adx,
            AdxLine::PlusDi => series.plus_di,
            AdxLine::MinusDi => series.minus_di,
        }
    }
}
