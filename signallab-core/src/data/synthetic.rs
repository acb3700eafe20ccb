//! Deterministic synthetic provider for offline runs and demos.
//!
//! Produces a random walk from 100.0, seeded from the BLAKE3 hash of the
//! symbol, so the same symbol always yields the same bars. Bars start at a
//! fixed anchor and are spaced by the requested interval.

use super::provider::{parse_interval, BarRequest, MarketDataProvider, ProviderError, RawBar};
use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    /// Emit bars without volume (like spot FX and metals feeds).
    without_volume: bool,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_volume() -> Self {
        Self {
            without_volume: true,
        }
    }

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError> {
        let step = parse_interval(&request.interval).ok_or_else(|| ProviderError::Rejected {
            code: 400,
            message: format!("unsupported interval: {}", request.interval),
        })?;

        let seed: [u8; 32] = *blake3::hash(request.symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut price = 100.0_f64;
        let mut timestamp = Self::anchor();
        let mut bars = Vec::with_capacity(request.count);

        for _ in 0..request.count {
            let ret: f64 = rng.gen_range(-0.02..0.02);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

            bars.push(RawBar::numeric(
                timestamp,
                open,
                high,
                low,
                close,
                (!self.without_volume).then_some(volume),
            ));

            price = close;
            timestamp = timestamp
                .checked_add_signed(step)
                .ok_or_else(|| ProviderError::Rejected {
                    code: 400,
                    message: format!(
                        "{} bars of {} run past the last representable timestamp",
                        request.count, request.interval
                    ),
                })?;
        }

        if bars.is_empty() {
            return Err(ProviderError::EmptyPayload);
        }
        Ok(bars)
    }
}
