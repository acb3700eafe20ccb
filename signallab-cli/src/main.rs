//! SignalLab CLI: analyze symbols and print the default configuration.
//!
//! Commands:
//! - `analyze`: fetch bars for each symbol, evaluate, print one line each,
//!   optionally narrate and export `signals.json` / `signals.csv`
//! - `config`: print the default runner configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use signallab_core::narrative::{Narrator, TemplateNarrator};
use signallab_core::SignalEngine;
use signallab_runner::{
    evaluate_batch, init_tracing, save_report, BatchReport, BatchSettings, ProviderConfig,
    RunnerConfig, SymbolOutcome,
};

#[derive(Parser)]
#[command(
    name = "signallab",
    about = "SignalLab CLI: OHLCV indicator battery and trading signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one or more symbols.
    Analyze {
        /// Symbols to evaluate (e.g., EUR/USD XAU/USD). Defaults to the config's list.
        symbols: Vec<String>,

        /// Path to a runner TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar interval (1min, 5min, 15min, 30min, 45min, 1h, 2h, 4h, 1day, 1week).
        #[arg(long)]
        interval: Option<String>,

        /// Number of most recent bars to fetch.
        #[arg(long)]
        count: Option<usize>,

        /// Read bars from <DIR>/<SYMBOL>.csv instead of the network.
        #[arg(long, conflicts_with = "synthetic")]
        csv_dir: Option<PathBuf>,

        /// Use deterministic synthetic bars.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Minimum confidence (0-10) for a BUY or SELL.
        #[arg(long)]
        threshold: Option<u8>,

        /// Worker threads.
        #[arg(long)]
        threads: Option<usize>,

        /// Write signals.json and signals.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print a narrative report per symbol.
        #[arg(long, default_value_t = false)]
        narrate: bool,

        /// Emit logs as JSON lines.
        #[arg(long, default_value_t = false)]
        json_logs: bool,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            config,
            interval,
            count,
            csv_dir,
            synthetic,
            threshold,
            threads,
            output_dir,
            narrate,
            json_logs,
        } => {
            init_tracing(json_logs)?;
            let mut runner_config = match config {
                Some(path) => RunnerConfig::from_file(&path)?,
                None => RunnerConfig::default(),
            };
            apply_overrides(
                &mut runner_config,
                Overrides {
                    symbols,
                    interval,
                    count,
                    csv_dir,
                    synthetic,
                    threshold,
                    threads,
                },
            )?;
            run_analyze(&runner_config, output_dir, narrate)
        }
        Commands::Config => {
            print!("{}", RunnerConfig::default().to_toml()?);
            Ok(())
        }
    }
}

struct Overrides {
    symbols: Vec<String>,
    interval: Option<String>,
    count: Option<usize>,
    csv_dir: Option<PathBuf>,
    synthetic: bool,
    threshold: Option<u8>,
    threads: Option<usize>,
}

fn apply_overrides(config: &mut RunnerConfig, o: Overrides) -> Result<()> {
    if !o.symbols.is_empty() {
        config.symbols = o.symbols;
    }
    if let Some(interval) = o.interval {
        config.interval = interval;
    }
    if let Some(count) = o.count {
        config.bar_count = count;
    }
    if let Some(dir) = o.csv_dir {
        config.provider = ProviderConfig::Csv { dir };
    } else if o.synthetic {
        config.provider = ProviderConfig::Synthetic {
            without_volume: false,
        };
    }
    if let Some(threshold) = o.threshold {
        config.engine.confidence_threshold = threshold;
    }
    if let Some(threads) = o.threads {
        config.threads = threads;
    }
    if config.symbols.is_empty() {
        bail!("no symbols given and none in the config");
    }
    config.validate().context("invalid configuration")?;
    Ok(())
}

fn run_analyze(config: &RunnerConfig, output_dir: Option<PathBuf>, narrate: bool) -> Result<()> {
    let engine = SignalEngine::new(config.engine.clone())?;
    let provider = config.provider.build()?;
    debug!(provider = provider.name(), symbols = config.symbols.len(), "starting batch");

    let narrator = TemplateNarrator::default();
    let report = evaluate_batch(
        &engine,
        provider.as_ref(),
        &config.symbols,
        &BatchSettings::from(config),
        narrate.then_some(&narrator as &dyn Narrator),
    );

    print_summary(&report);

    if let Some(dir) = output_dir {
        let (json_path, csv_path) = save_report(&report, &dir)?;
        println!("Saved: {} and {}", json_path.display(), csv_path.display());
    }

    if report.all_failed() {
        bail!("all {} symbols failed", report.failed);
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        match outcome {
            SymbolOutcome::Ok {
                analysis,
                narrative,
                ..
            } => {
                let s = &analysis.signal;
                let levels = match &s.levels {
                    Some(l) => format!(
                        " | entry {:.4} SL {:.4} TP1 {:.4} TP2 {:.4}",
                        l.entry, l.stop_loss, l.take_profit_1, l.take_profit_2
                    ),
                    None => String::new(),
                };
                println!(
                    "{:<10} {:<4} confidence {} | trend {} | price {:.4}{}",
                    s.symbol, s.bias, s.confidence, s.regime.trend, s.price, levels
                );
                if let Some(text) = narrative {
                    println!("{text}");
                }
            }
            SymbolOutcome::Failed {
                symbol,
                kind,
                message,
            } => {
                println!("{symbol:<10} ERROR {kind}: {message}");
            }
        }
    }
    println!("{} succeeded, {} failed", report.succeeded, report.failed);
}
