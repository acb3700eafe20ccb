//! SignalLab Runner: batch evaluation of many symbols.
//!
//! This crate builds on `signallab-core` to provide:
//! - Runner configuration (symbols, provider, worker threads, engine)
//! - Tracing subscriber setup
//! - Parallel, partial-failure-tolerant batch evaluation
//! - JSON and CSV export of batch results

pub mod batch;
pub mod config;
pub mod export;
pub mod logging;

pub use batch::{evaluate_batch, BatchReport, BatchSettings, SymbolOutcome};
pub use config::{ProviderConfig, RunnerConfig, RunnerConfigError};
pub use export::{export_csv, export_json, save_report};
pub use logging::init_tracing;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<SymbolOutcome>();
        assert_sync::<SymbolOutcome>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunnerConfig>();
        assert_sync::<RunnerConfig>();
        assert_send::<ProviderConfig>();
        assert_sync::<ProviderConfig>();
    }
}
