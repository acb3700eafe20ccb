//! Bar series validator: raw provider rows → ordered, clean `BarSeries`.
//!
//! Steps, in order:
//! 1. coerce timestamp and OHLC; rows failing coercion are dropped
//! 2. drop rows failing OHLC sanity (see [`Bar::is_sane`])
//! 3. stable sort ascending by timestamp, keep the first row per timestamp
//! 4. enforce the minimum length
//!
//! Volume is coerced independently: an unparsable volume leaves the bar with
//! `volume = None` instead of dropping the bar.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::provider::RawBar;
use crate::domain::{Bar, BarSeries};
use crate::error::SignalError;

/// What the validator did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub input_rows: usize,
    pub dropped_malformed: usize,
    pub dropped_duplicates: usize,
    pub output_rows: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_malformed == 0 && self.dropped_duplicates == 0
    }
}

fn coerce_row(raw: &RawBar) -> Option<Bar> {
    let bar = Bar {
        timestamp: raw.timestamp.as_ref()?.coerce_timestamp()?,
        open: raw.open.as_ref()?.coerce_f64()?,
        high: raw.high.as_ref()?.coerce_f64()?,
        low: raw.low.as_ref()?.coerce_f64()?,
        close: raw.close.as_ref()?.coerce_f64()?,
        volume: raw
            .volume
            .as_ref()
            .and_then(|v| v.coerce_f64())
            .filter(|v| *v >= 0.0),
    };
    bar.is_sane().then_some(bar)
}

/// Validate `raw` rows for `symbol` into a series of at least `minimum_bars`.
///
/// # Errors
/// - [`SignalError::MalformedBar`] when rows were supplied but none survived
/// - [`SignalError::InsufficientData`] when fewer than `minimum_bars` remain
pub fn validate_bars(
    symbol: &str,
    raw: &[RawBar],
    minimum_bars: usize,
) -> Result<(BarSeries, ValidationReport), SignalError> {
    let mut bars: Vec<Bar> = raw.iter().filter_map(coerce_row).collect();
    let dropped_malformed = raw.len() - bars.len();

    if !raw.is_empty() && bars.is_empty() {
        warn!(symbol, rows = raw.len(), "every row failed validation");
        return Err(SignalError::MalformedBar {
            symbol: symbol.to_string(),
            rows: raw.len(),
        });
    }

    // Stable sort keeps input order among equal timestamps, so dedup keeps
    // the first occurrence.
    bars.sort_by_key(|b| b.timestamp);
    let before_dedup = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let dropped_duplicates = before_dedup - bars.len();

    let report = ValidationReport {
        input_rows: raw.len(),
        dropped_malformed,
        dropped_duplicates,
        output_rows: bars.len(),
    };

    if !report.is_clean() {
        warn!(
            symbol,
            dropped_malformed, dropped_duplicates, kept = bars.len(),
            "dropped rows during validation"
        );
    }

    if bars.len() < minimum_bars {
        return Err(SignalError::InsufficientData {
            symbol: symbol.to_string(),
            required: minimum_bars,
            actual: bars.len(),
        });
    }

    debug!(symbol, bars = bars.len(), "bar series validated");
    Ok((BarSeries::from_validated(symbol.to_string(), bars), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::RawField;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(i)
    }

    fn row(i: i64, close: f64) -> RawBar {
        RawBar::numeric(ts(i), close, close + 1.0, close - 1.0, close, Some(1000.0))
    }

    #[test]
    fn sorts_ascending() {
        let raw = vec![row(2, 102.0), row(0, 100.0), row(1, 101.0)];
        let (series, report) = validate_bars("SPY", &raw, 1).unwrap();
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![100.0, 101.0, 102.0]);
        assert!(report.is_clean());
        assert_eq!(report.output_rows, 3);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let raw = vec![row(0, 100.0), row(1, 101.0), row(1, 150.0)];
        let (series, report) = validate_bars("SPY", &raw, 1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].close, 101.0);
        assert_eq!(report.dropped_duplicates, 1);
    }

    #[test]
    fn drops_uncoercible_rows() {
        let mut bad = row(1, 101.0);
        bad.close = Some(RawField::from("—"));
        let mut no_ts = row(2, 102.0);
        no_ts.timestamp = None;
        let raw = vec![row(0, 100.0), bad, no_ts, row(3, 103.0)];
        let (series, report) = validate_bars("SPY", &raw, 1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(report.dropped_malformed, 2);
    }

    #[test]
    fn drops_insane_rows() {
        let mut inverted = row(1, 101.0);
        inverted.high = Some(RawField::Number(90.0));
        let raw = vec![row(0, 100.0), inverted];
        let (series, _) = validate_bars("SPY", &raw, 1).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn unparsable_volume_keeps_bar() {
        let mut odd = row(1, 101.0);
        odd.volume = Some(RawField::from("abc"));
        let raw = vec![row(0, 100.0), odd];
        let (series, report) = validate_bars("SPY", &raw, 1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].volume, None);
        assert!(series.volume_available());
        assert!(report.is_clean());
    }

    #[test]
    fn missing_volume_column_marks_series() {
        let raw: Vec<RawBar> = (0..5)
            .map(|i| RawBar::numeric(ts(i), 100.0, 101.0, 99.0, 100.0, None))
            .collect();
        let (series, _) = validate_bars("XAU/USD", &raw, 5).unwrap();
        assert!(!series.volume_available());
    }

    #[test]
    fn all_rows_malformed() {
        let raw = vec![RawBar::default(), RawBar::default()];
        let err = validate_bars("SPY", &raw, 1).unwrap_err();
        assert!(matches!(err, SignalError::MalformedBar { rows: 2, .. }));
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = validate_bars("SPY", &[], 50).unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientData {
                required: 50,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn too_short_after_cleaning() {
        let mut raw: Vec<RawBar> = (0..50).map(|i| row(i, 100.0 + i as f64)).collect();
        raw[10].open = None;
        let err = validate_bars("SPY", &raw, 50).unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientData {
                required: 50,
                actual: 49,
                ..
            }
        ));
    }
}
