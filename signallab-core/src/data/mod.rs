//! Market data: provider trait and implementations, pacing, and validation.

pub mod circuit_breaker;
pub mod csv_import;
pub mod pacer;
pub mod provider;
pub mod synthetic;
pub mod twelve_data;
pub mod validate;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_import::CsvProvider;
pub use pacer::{PacedProvider, RequestPacer};
pub use provider::{
    parse_interval, BarRequest, MarketDataProvider, ProviderError, RawBar, RawField,
};
pub use synthetic::SyntheticProvider;
pub use twelve_data::{TwelveDataProvider, TwelveDataSettings};
pub use validate::{validate_bars, ValidationReport};
