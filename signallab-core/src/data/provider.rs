//! Data provider trait, raw rows, and structured provider errors.
//!
//! The `MarketDataProvider` trait abstracts over data sources (Twelve Data,
//! CSV directory, synthetic) so the batch runner can swap implementations and
//! tests can mock them. Providers return unvalidated [`RawBar`] rows; the
//! validator turns those into a [`crate::domain::BarSeries`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One loosely typed field as it arrived from a provider.
///
/// Twelve Data quotes numbers as JSON strings, CSV files are all text, and
/// some feeds send real numbers. Coercion happens in the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
}

impl RawField {
    /// Coerce to a finite float. Empty, unparsable and non-finite → `None`.
    pub fn coerce_f64(&self) -> Option<f64> {
        let value = match self {
            RawField::Number(n) => *n,
            RawField::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Coerce to a timestamp.
    ///
    /// Numbers are epoch seconds (UTC). Text accepts `YYYY-MM-DD HH:MM:SS`,
    /// `YYYY-MM-DDTHH:MM:SS`, RFC 3339, a bare date (midnight), or digits
    /// as epoch seconds.
    pub fn coerce_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RawField::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                DateTime::from_timestamp(*n as i64, 0).map(|dt| dt.naive_utc())
            }
            RawField::Number(_) => None,
            RawField::Text(s) => parse_timestamp_text(s.trim()),
        }
    }
}

impl From<f64> for RawField {
    fn from(value: f64) -> Self {
        RawField::Number(value)
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_string())
    }
}

fn parse_timestamp_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        let secs = s.parse::<i64>().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    None
}

/// One provider row before validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBar {
    #[serde(rename = "datetime", alias = "timestamp", alias = "time", default)]
    pub timestamp: Option<RawField>,
    #[serde(default)]
    pub open: Option<RawField>,
    #[serde(default)]
    pub high: Option<RawField>,
    #[serde(default)]
    pub low: Option<RawField>,
    #[serde(default)]
    pub close: Option<RawField>,
    #[serde(default)]
    pub volume: Option<RawField>,
}

impl RawBar {
    /// Convenience constructor for numeric rows (tests, synthetic data).
    pub fn numeric(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            timestamp: Some(RawField::Text(
                timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            )),
            open: Some(RawField::Number(open)),
            high: Some(RawField::Number(high)),
            low: Some(RawField::Number(low)),
            close: Some(RawField::Number(close)),
            volume: volume.map(RawField::Number),
        }
    }
}

/// What to fetch: symbol, bar interval, number of most recent bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRequest {
    pub symbol: String,
    pub interval: String,
    pub count: usize,
}

impl BarRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, count: usize) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            count,
        }
    }
}

/// Parse a provider interval string (`1min`, `15min`, `1h`, `1day`, `1week`, ...).
///
/// Counts too large for a `Duration` are rejected like unknown units.
pub fn parse_interval(interval: &str) -> Option<Duration> {
    let s = interval.trim();
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = s.split_at(split);
    let n: i64 = digits.parse().ok().filter(|n| *n > 0)?;
    match unit {
        "min" => Duration::try_minutes(n),
        "h" => Duration::try_hours(n),
        "day" => Duration::try_days(n),
        "week" => Duration::try_weeks(n),
        _ => None,
    }
}

/// Structured error types for provider operations.
///
/// All of them surface to the engine as `SignalError::DataUnavailable`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    Transport(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider rejected request ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("provider returned an empty payload")]
    EmptyPayload,

    #[error("response format changed: {0}")]
    MalformedPayload(String),

    #[error("hard stop: provider blocked (circuit breaker open)")]
    CircuitOpen,

    #[error("symbol not found: {symbol}")]
    NotFound { symbol: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Trait for market-data providers.
///
/// Implementations handle the specifics of one source. Pacing sits above
/// this trait ([`crate::data::pacer::PacedProvider`]); providers don't know
/// about each other.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `request.count` most recent bars. Row order is not
    /// guaranteed; the validator sorts.
    fn fetch(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError>;
}
