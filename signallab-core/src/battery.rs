//! Indicator battery: one validated series in, one typed snapshot out.
//!
//! The battery computes every requested indicator over the full series and
//! reads the latest bar into an [`IndicatorSnapshot`]. Indicators the caller
//! did not request report `NotRequested`. Close EMAs (shared by the EMA
//! readings and MACD) and the true range (shared by ATR and ADX) are
//! computed once per call.

use crate::config::IndicatorWindows;
use crate::domain::{Bar, BarSeries};
use crate::indicators::adx::{adx_from_true_range, Adx, AdxLine};
use crate::indicators::atr::{atr_from_true_range, true_range, Atr};
use crate::indicators::bollinger::{Bollinger, BollingerBand};
use crate::indicators::ema::{ema_of_series, Ema};
use crate::indicators::macd::{macd_from_emas, Macd, MacdLine};
use crate::indicators::stochastic::{Stochastic, StochasticLine};
use crate::indicators::{
    closes, Cci, Cmf, Indicator, IndicatorHistory, Obv, Reading, Rsi, Sma, Unavailability,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Indicators the battery can compute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    EmaFast,
    EmaSlow,
    SmaFast,
    SmaSlow,
    Rsi,
    Macd,
    Stochastic,
    Cci,
    Adx,
    Atr,
    Bollinger,
    Obv,
    Cmf,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 13] = [
        IndicatorKind::EmaFast,
        IndicatorKind::EmaSlow,
        IndicatorKind::SmaFast,
        IndicatorKind::SmaSlow,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Stochastic,
        IndicatorKind::Cci,
        IndicatorKind::Adx,
        IndicatorKind::Atr,
        IndicatorKind::Bollinger,
        IndicatorKind::Obv,
        IndicatorKind::Cmf,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub line: Reading,
    pub signal: Reading,
    pub histogram: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub k: Reading,
    pub d: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxReading {
    pub adx: Reading,
    pub plus_di: Reading,
    pub minus_di: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub upper: Reading,
    pub middle: Reading,
    pub lower: Reading,
}

/// Indicator readings at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Latest close.
    pub price: f64,
    pub ema_fast: Reading,
    pub ema_slow: Reading,
    pub sma_fast: Reading,
    pub sma_slow: Reading,
    pub rsi: Reading,
    pub macd: MacdReading,
    pub stochastic: StochasticReading,
    pub cci: Reading,
    pub adx: AdxReading,
    pub atr: Reading,
    pub bollinger: BollingerReading,
    pub obv: Reading,
    pub cmf: Reading,
}

impl IndicatorSnapshot {
    /// Every reading `NotRequested`, at the given price.
    pub fn not_requested(price: f64) -> Self {
        let r = Reading::Unavailable(Unavailability::NotRequested);
        Self {
            price,
            ema_fast: r,
            ema_slow: r,
            sma_fast: r,
            sma_slow: r,
            rsi: r,
            macd: MacdReading {
                line: r,
                signal: r,
                histogram: r,
            },
            stochastic: StochasticReading { k: r, d: r },
            cci: r,
            adx: AdxReading {
                adx: r,
                plus_di: r,
                minus_di: r,
            },
            atr: r,
            bollinger: BollingerReading {
                upper: r,
                middle: r,
                lower: r,
            },
            obv: r,
            cmf: r,
        }
    }
}

/// Intermediate series shared between indicators within one call.
struct SharedSeries<'a> {
    bars: &'a [Bar],
    closes: Vec<f64>,
    emas: HashMap<usize, Vec<f64>>,
    tr: Option<Vec<f64>>,
}

impl<'a> SharedSeries<'a> {
    fn new(bars: &'a [Bar]) -> Self {
        Self {
            bars,
            closes: closes(bars),
            emas: HashMap::new(),
            tr: None,
        }
    }

    fn ema(&mut self, period: usize) -> &[f64] {
        let closes = &self.closes;
        self.emas
            .entry(period)
            .or_insert_with(|| ema_of_series(closes, period))
    }

    fn tr(&mut self) -> &[f64] {
        let bars = self.bars;
        self.tr.get_or_insert_with(|| true_range(bars))
    }
}

/// Records full series into an optional history.
struct Recorder<'h> {
    history: Option<&'h mut IndicatorHistory>,
}

impl Recorder<'_> {
    fn read(&mut self, indicator: &dyn Indicator, series: Vec<f64>) -> Reading {
        let reading = Reading::at_end(&series, indicator.lookback());
        if let Some(history) = self.history.as_deref_mut() {
            history.insert(indicator.name(), series);
        }
        reading
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorBattery {
    windows: IndicatorWindows,
    requested: BTreeSet<IndicatorKind>,
}

impl IndicatorBattery {
    /// Battery computing every indicator.
    pub fn new(windows: IndicatorWindows) -> Self {
        Self {
            windows,
            requested: IndicatorKind::ALL.into_iter().collect(),
        }
    }

    /// Battery restricted to `kinds`; everything else reports `NotRequested`.
    pub fn only(windows: IndicatorWindows, kinds: &[IndicatorKind]) -> Self {
        Self {
            windows,
            requested: kinds.iter().copied().collect(),
        }
    }

    pub fn is_requested(&self, kind: IndicatorKind) -> bool {
        self.requested.contains(&kind)
    }

    pub fn windows(&self) -> &IndicatorWindows {
        &self.windows
    }

    pub fn compute(&self, series: &BarSeries) -> IndicatorSnapshot {
        self.run(series, None)
    }

    /// Snapshot plus the full series of every computed indicator.
    pub fn compute_with_history(&self, series: &BarSeries) -> (IndicatorSnapshot, IndicatorHistory) {
        let mut history = IndicatorHistory::new();
        let snapshot = self.run(series, Some(&mut history));
        (snapshot, history)
    }

    fn run(&self, series: &BarSeries, history: Option<&mut IndicatorHistory>) -> IndicatorSnapshot {
        let bars = series.bars();
        let w = &self.windows;
        let price = series.last().map_or(f64::NAN, |b| b.close);
        let mut snap = IndicatorSnapshot::not_requested(price);
        let mut shared = SharedSeries::new(bars);
        let mut rec = Recorder { history };

        for kind in &self.requested {
            match kind {
                IndicatorKind::EmaFast => {
                    let ind = Ema::new(w.ema_fast);
                    snap.ema_fast = rec.read(&ind, shared.ema(w.ema_fast).to_vec());
                }
                IndicatorKind::EmaSlow => {
                    let ind = Ema::new(w.ema_slow);
                    snap.ema_slow = rec.read(&ind, shared.ema(w.ema_slow).to_vec());
                }
                IndicatorKind::SmaFast => {
                    let ind = Sma::new(w.sma_fast);
                    snap.sma_fast = rec.read(&ind, ind.compute(bars));
                }
                IndicatorKind::SmaSlow => {
                    let ind = Sma::new(w.sma_slow);
                    snap.sma_slow = rec.read(&ind, ind.compute(bars));
                }
                IndicatorKind::Rsi => {
                    let ind = Rsi::new(w.rsi);
                    snap.rsi = rec.read(&ind, ind.compute(bars));
                }
                IndicatorKind::Macd => {
                    let fast = shared.ema(w.macd_fast).to_vec();
                    let slow = shared.ema(w.macd_slow);
                    let macd = macd_from_emas(&fast, slow, w.macd_signal);
                    let out = |line| Macd::new(w.macd_fast, w.macd_slow, w.macd_signal, line);
                    snap.macd = MacdReading {
                        line: rec.read(&out(MacdLine::Line), macd.line),
                        signal: rec.read(&out(MacdLine::Signal), macd.signal),
                        histogram: rec.read(&out(MacdLine::Histogram), macd.histogram),
                    };
                }
                IndicatorKind::Stochastic => {
                    let k_ind = Stochastic::new(w.stochastic_k, w.stochastic_d, StochasticLine::K);
                    let d_ind = Stochastic::new(w.stochastic_k, w.stochastic_d, StochasticLine::D);
                    let (k, d) = k_ind.series(bars);
                    snap.stochastic = StochasticReading {
                        k: rec.read(&k_ind, k),
                        d: rec.read(&d_ind, d),
                    };
                }
                IndicatorKind::Cci => {
                    let ind = Cci::new(w.cci);
                    snap.cci = rec.read(&ind, ind.compute(bars));
                }
                IndicatorKind::Adx => {
                    let tr = shared.tr().to_vec();
                    let adx = adx_from_true_range(bars, &tr, w.adx);
                    snap.adx = AdxReading {
                        adx: rec.read(&Adx::new(w.adx, AdxLine::Adx), adx.adx),
                        plus_di: rec.read(&Adx::new(w.adx, AdxLine::PlusDi), adx.plus_di),
                        minus_di: rec.read(&Adx::new(w.adx, AdxLine::MinusDi), adx.minus_di),
                    };
                }
                IndicatorKind::Atr => {
                    let ind = Atr::new(w.atr);
                    snap.atr = rec.read(&ind, atr_from_true_range(shared.tr(), w.atr));
                }
                IndicatorKind::Bollinger => {
                    let band = |b| Bollinger::new(w.bollinger, w.bollinger_k, b);
                    let bb = band(BollingerBand::Middle).series(bars);
                    snap.bollinger = BollingerReading {
                        upper: rec.read(&band(BollingerBand::Upper), bb.upper),
                        middle: rec.read(&band(BollingerBand::Middle), bb.middle),
                        lower: rec.read(&band(BollingerBand::Lower), bb.lower),
                    };
                }
                IndicatorKind::Obv => {
                    snap.obv = if bars.iter().all(|b| b.volume.is_some()) && !bars.is_empty() {
                        let ind = Obv::new();
                        rec.read(&ind, ind.compute(bars))
                    } else {
                        Reading::Unavailable(Unavailability::MissingVolume)
                    };
                }
                IndicatorKind::Cmf => {
                    let ind = Cmf::new(w.cmf);
                    snap.cmf = if !series.volume_available() {
                        Reading::Unavailable(Unavailability::MissingVolume)
                    } else if bars.len() <= ind.lookback() {
                        Reading::Unavailable(Unavailability::InsufficientHistory)
                    } else if bars[bars.len() - ind.period()..]
                        .iter()
                        .any(|b| b.volume.is_none())
                    {
                        Reading::Unavailable(Unavailability::MissingVolume)
                    } else {
                        rec.read(&ind, ind.compute(bars))
                    };
                }
            }
        }

        debug!(
            symbol = series.symbol(),
            bars = bars.len(),
            requested = self.requested.len(),
            shared_emas = shared.emas.len(),
            "indicator battery computed"
        );
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::RawBar;
    use crate::data::validate::validate_bars;
    use crate::indicators::make_bars;

    fn series_from(bars: Vec<Bar>) -> BarSeries {
        BarSeries::from_validated("TEST".to_string(), bars)
    }

    fn ramp(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        series_from(make_bars(&closes))
    }

    #[test]
    fn full_battery_on_sixty_bars() {
        let snap = IndicatorBattery::new(IndicatorWindows::default()).compute(&ramp(60));
        assert_eq!(snap.price, 159.0);
        for r in [
            snap.ema_fast,
            snap.ema_slow,
            snap.sma_fast,
            snap.sma_slow,
            snap.rsi,
            snap.macd.line,
            snap.macd.signal,
            snap.macd.histogram,
            snap.stochastic.k,
            snap.stochastic.d,
            snap.cci,
            snap.adx.adx,
            snap.adx.plus_di,
            snap.adx.minus_di,
            snap.atr,
            snap.bollinger.upper,
            snap.bollinger.middle,
            snap.bollinger.lower,
            snap.obv,
            snap.cmf,
        ] {
            assert!(r.is_available(), "unexpected {r:?}");
        }
    }

    #[test]
    fn short_series_reports_insufficient_history() {
        let snap = IndicatorBattery::new(IndicatorWindows::default()).compute(&ramp(30));
        let insufficient = Reading::Unavailable(Unavailability::InsufficientHistory);
        assert_eq!(snap.sma_slow, insufficient);
        assert_eq!(snap.macd.signal, insufficient);
        assert!(snap.ema_slow.is_available());
        assert!(snap.adx.adx.is_available());
    }

    #[test]
    fn restricted_battery_marks_not_requested() {
        let battery =
            IndicatorBattery::only(IndicatorWindows::default(), &[IndicatorKind::Rsi]);
        let snap = battery.compute(&ramp(60));
        assert!(snap.rsi.is_available());
        assert_eq!(
            snap.macd.line,
            Reading::Unavailable(Unavailability::NotRequested)
        );
        assert!(!battery.is_requested(IndicatorKind::Atr));
    }

    #[test]
    fn volume_indicators_without_volume() {
        let raw: Vec<RawBar> = make_bars(&(0..60).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
            .into_iter()
            .map(|b| RawBar::numeric(b.timestamp, b.open, b.high, b.low, b.close, None))
            .collect();
        let (series, _) = validate_bars("XAU/USD", &raw, 50).unwrap();
        let snap = IndicatorBattery::new(IndicatorWindows::default()).compute(&series);
        let missing = Reading::Unavailable(Unavailability::MissingVolume);
        assert_eq!(snap.obv, missing);
        assert_eq!(snap.cmf, missing);
        assert!(snap.atr.is_available());
    }

    #[test]
    fn history_matches_snapshot() {
        let battery = IndicatorBattery::new(IndicatorWindows::default());
        let series = ramp(60);
        let (snap, history) = battery.compute_with_history(&series);
        assert_eq!(snap, battery.compute(&series));
        let rsi = history.get("rsi_14", 59).unwrap();
        assert_eq!(snap.rsi, Reading::Value(rsi));
        assert!(history.get_series("macd_signal_12_26_9").is_some());
        assert!(history.get_series("plus_di_14").is_some());
        assert!(history.get_series("bollinger_upper_20").is_some());
    }

    #[test]
    fn shared_ema_computed_once_per_period() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let mut shared = SharedSeries::new(&bars);
        let first = shared.ema(2).to_vec();
        let second = shared.ema(2).to_vec();
        assert_eq!(shared.emas.len(), 1);
        assert_eq!(first[2], second[2]);
    }

    #[test]
    fn macd_matches_standalone_indicator() {
        let series = ramp(60);
        let snap = IndicatorBattery::new(IndicatorWindows::default()).compute(&series);
        let standalone = Macd::new(12, 26, 9, MacdLine::Signal).compute(series.bars());
        assert_eq!(snap.macd.signal, Reading::Value(standalone[59]));
    }
}
