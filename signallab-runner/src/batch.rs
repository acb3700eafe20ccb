//! Multi-symbol evaluation on a private rayon pool.
//!
//! Each symbol runs fetch → validate → evaluate → (narrate) independently.
//! A failure for one symbol becomes a `Failed` entry in its slot; the rest
//! of the batch proceeds. Output order matches input order.

use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use signallab_core::data::{BarRequest, MarketDataProvider};
use signallab_core::narrative::{narrate_or_fallback, Narrator, NarratorContext};
use signallab_core::{Analysis, SignalEngine};

use crate::config::RunnerConfig;

/// Per-run request parameters shared by every symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub interval: String,
    pub bar_count: usize,
    pub threads: usize,
}

impl From<&RunnerConfig> for BatchSettings {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            interval: config.interval.clone(),
            bar_count: config.bar_count,
            threads: config.worker_threads(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Ok {
        symbol: String,
        analysis: Box<Analysis>,
        #[serde(skip_serializing_if = "Option::is_none")]
        narrative: Option<String>,
    },
    Failed {
        symbol: String,
        kind: String,
        message: String,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Ok { symbol, .. } | SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SymbolOutcome::Ok { .. })
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            SymbolOutcome::Ok { analysis, .. } => Some(analysis),
            SymbolOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SymbolOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<SymbolOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            outcomes,
            succeeded,
            failed,
        }
    }

    /// True when there was at least one symbol and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded == 0
    }
}

fn evaluate_symbol(
    engine: &SignalEngine,
    provider: &dyn MarketDataProvider,
    symbol: &str,
    settings: &BatchSettings,
    narrator: Option<&dyn Narrator>,
) -> SymbolOutcome {
    let request = BarRequest::new(symbol, settings.interval.clone(), settings.bar_count);
    match engine.fetch_and_analyze(provider, &request) {
        Ok(analysis) => {
            let narrative = narrator.map(|n| {
                let context = NarratorContext::from_analysis(&analysis);
                narrate_or_fallback(n, &context)
            });
            SymbolOutcome::Ok {
                symbol: symbol.to_string(),
                analysis: Box::new(analysis),
                narrative,
            }
        }
        Err(err) => {
            warn!(symbol, kind = err.kind(), error = %err, "symbol failed");
            SymbolOutcome::Failed {
                symbol: symbol.to_string(),
                kind: err.kind().to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Evaluate every symbol, in parallel when `settings.threads > 1`.
///
/// If the pool cannot be built the batch runs sequentially.
pub fn evaluate_batch(
    engine: &SignalEngine,
    provider: &dyn MarketDataProvider,
    symbols: &[String],
    settings: &BatchSettings,
    narrator: Option<&dyn Narrator>,
) -> BatchReport {
    let started = Instant::now();
    let run = |symbol: &String| evaluate_symbol(engine, provider, symbol, settings, narrator);

    let pool = if settings.threads > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "failed to build thread pool, running sequentially");
                None
            }
        }
    } else {
        None
    };

    let outcomes: Vec<SymbolOutcome> = match pool {
        Some(pool) => pool.install(|| symbols.par_iter().map(run).collect()),
        None => symbols.iter().map(run).collect(),
    };

    let report = BatchReport::from_outcomes(outcomes);
    info!(
        provider = provider.name(),
        symbols = symbols.len(),
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use signallab_core::data::SyntheticProvider;
    use signallab_core::EngineConfig;

    fn settings(threads: usize) -> BatchSettings {
        BatchSettings {
            interval: "1h".to_string(),
            bar_count: 100,
            threads,
        }
    }

    #[test]
    fn keeps_input_order() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let symbols: Vec<String> = ["C", "A", "B", "D"].iter().map(|s| s.to_string()).collect();
        let report = evaluate_batch(&engine, &SyntheticProvider::new(), &symbols, &settings(3), None);
        let order: Vec<&str> = report.outcomes.iter().map(|o| o.symbol()).collect();
        assert_eq!(order, vec!["C", "A", "B", "D"]);
        assert_eq!(report.succeeded, 4);
        assert!(!report.all_failed());
    }

    #[test]
    fn parallel_matches_sequential() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let symbols: Vec<String> = (0..6).map(|i| format!("SYM{i}")).collect();
        let provider = SyntheticProvider::new();
        let seq = evaluate_batch(&engine, &provider, &symbols, &settings(1), None);
        let par = evaluate_batch(&engine, &provider, &symbols, &settings(4), None);
        let fp = |r: &BatchReport| -> Vec<String> {
            r.outcomes
                .iter()
                .filter_map(|o| o.analysis().map(|a| a.signal.fingerprint()))
                .collect()
        };
        assert_eq!(fp(&seq), fp(&par));
    }

    #[test]
    fn too_few_bars_fails_every_symbol() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let symbols = vec!["A".to_string()];
        let mut short = settings(1);
        short.bar_count = 10;
        let report = evaluate_batch(&engine, &SyntheticProvider::new(), &symbols, &short, None);
        assert!(report.all_failed());
        match &report.outcomes[0] {
            SymbolOutcome::Failed { kind, .. } => assert_eq!(kind, "insufficient_data"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
