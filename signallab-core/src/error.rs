//! Engine error taxonomy.
//!
//! Every variant is fatal for one symbol's run only. Per-indicator gaps are
//! not errors; they travel as [`crate::indicators::Reading::Unavailable`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::provider::ProviderError;

#[derive(Debug, Error)]
pub enum SignalError {
    /// The provider returned nothing usable (empty payload, missing fields,
    /// transport failure, rate-limit rejection).
    #[error("data unavailable for '{symbol}': {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// The provider returned rows but none survived coercion and sanity checks.
    #[error("malformed bars for '{symbol}': all {rows} rows failed validation")]
    MalformedBar { symbol: String, rows: usize },

    /// Enough rows may have arrived, but too few clean bars remain.
    #[error("insufficient data for '{symbol}': {actual} clean bars, {required} required")]
    InsufficientData {
        symbol: String,
        required: usize,
        actual: usize,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl SignalError {
    /// Wrap a provider failure for `symbol`.
    pub fn data_unavailable(symbol: &str, err: &ProviderError) -> Self {
        SignalError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: err.to_string(),
        }
    }

    /// Short machine-readable kind, used in exported reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalError::DataUnavailable { .. } => "data_unavailable",
            SignalError::MalformedBar { .. } => "malformed_bar",
            SignalError::InsufficientData { .. } => "insufficient_data",
            SignalError::Config(_) => "config",
        }
    }
}
