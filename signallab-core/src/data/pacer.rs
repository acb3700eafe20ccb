//! Request pacing for rate-limited providers.
//!
//! Free-tier market-data APIs require a minimum delay between successive
//! calls. A single `RequestPacer` is shared by every worker evaluating
//! symbols: each caller reserves the next free slot under the lock, then
//! sleeps outside it, so concurrent symbol evaluations serialize their
//! provider calls while indicator work runs unthrottled. A rate-limit reply
//! pushes the next free slot out for everyone through [`RequestPacer::defer`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use super::provider::{BarRequest, MarketDataProvider, ProviderError, RawBar};

#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A pacer that never waits.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserve the next slot and return how long the caller must wait for it.
    pub fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = match *next {
            Some(at) if at > now => at,
            _ => now,
        };
        *next = Some(slot + self.min_interval);
        slot.saturating_duration_since(now)
    }

    /// Hold every later slot back until at least `wait` from now.
    pub fn defer(&self, wait: Duration) {
        let earliest = Instant::now() + wait;
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if next.map_or(true, |at| at < earliest) {
            *next = Some(earliest);
        }
    }

    /// Block until this caller's slot arrives.
    pub fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "pacing provider request");
            std::thread::sleep(wait);
        }
    }
}

/// Wraps a provider so every fetch goes through a shared pacer.
///
/// For providers that retry internally, hand the same pacer to the provider
/// instead so each attempt is paced (see
/// [`super::twelve_data::TwelveDataProvider::new`]).
pub struct PacedProvider<P> {
    inner: P,
    pacer: Arc<RequestPacer>,
}

impl<P: MarketDataProvider> PacedProvider<P> {
    pub fn new(inner: P, min_interval: Duration) -> Self {
        Self::with_pacer(inner, Arc::new(RequestPacer::new(min_interval)))
    }

    pub fn with_pacer(inner: P, pacer: Arc<RequestPacer>) -> Self {
        Self { inner, pacer }
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }
}

impl<P: MarketDataProvider> MarketDataProvider for PacedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError> {
        self.pacer.acquire();
        self.inner.fetch(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reservation_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_secs(5));
        assert_eq!(pacer.reserve(), Duration::ZERO);
    }

    #[test]
    fn successive_reservations_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_secs(5));
        pacer.reserve();
        let second = pacer.reserve();
        let third = pacer.reserve();
        assert!(second > Duration::from_millis(4900));
        assert!(third > Duration::from_millis(9900));
    }

    #[test]
    fn unthrottled_never_waits() {
        let pacer = RequestPacer::unthrottled();
        for _ in 0..5 {
            assert_eq!(pacer.reserve(), Duration::ZERO);
        }
    }

    #[test]
    fn defer_holds_back_the_next_slot() {
        let pacer = RequestPacer::new(Duration::from_millis(10));
        pacer.reserve();
        pacer.defer(Duration::from_secs(30));
        assert!(pacer.reserve() > Duration::from_secs(29));
        // Later slots keep the normal spacing after the deferred one.
        assert!(pacer.reserve() > Duration::from_millis(30_005));
    }

    #[test]
    fn defer_never_pulls_a_slot_forward() {
        let pacer = RequestPacer::new(Duration::from_secs(60));
        pacer.reserve();
        pacer.defer(Duration::from_secs(1));
        assert!(pacer.reserve() > Duration::from_secs(59));
    }

    #[test]
    fn concurrent_callers_get_distinct_slots() {
        let pacer = Arc::new(RequestPacer::new(Duration::from_millis(20)));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = Arc::clone(&pacer);
                std::thread::spawn(move || p.acquire())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Four calls, three gaps of 20ms.
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
