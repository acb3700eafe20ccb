//! Batch export: `signals.json` with full analyses, `signals.csv` with one
//! flat row per symbol.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::batch::{BatchReport, SymbolOutcome};

pub const JSON_FILE: &str = "signals.json";
pub const CSV_FILE: &str = "signals.csv";

/// One CSV row. Failed symbols leave the signal columns empty.
#[derive(Debug, Serialize)]
struct SignalRow<'a> {
    symbol: &'a str,
    status: &'static str,
    timestamp: Option<String>,
    price: Option<f64>,
    trend: Option<&'static str>,
    momentum: Option<&'static str>,
    atr: Option<f64>,
    volume_flow: Option<&'static str>,
    confidence: Option<u8>,
    bias: Option<&'static str>,
    entry: Option<f64>,
    stop_loss: Option<f64>,
    take_profit_1: Option<f64>,
    take_profit_2: Option<f64>,
    error: Option<&'a str>,
}

impl<'a> SignalRow<'a> {
    fn from_outcome(outcome: &'a SymbolOutcome) -> Self {
        match outcome {
            SymbolOutcome::Ok { symbol, analysis, .. } => {
                let signal = &analysis.signal;
                let levels = signal.levels.as_ref();
                Self {
                    symbol,
                    status: "ok",
                    timestamp: Some(signal.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
                    price: Some(signal.price),
                    trend: Some(signal.regime.trend.as_str()),
                    momentum: Some(signal.regime.momentum.as_str()),
                    atr: signal.regime.volatility.value(),
                    volume_flow: Some(signal.regime.volume_flow.as_str()),
                    confidence: Some(signal.confidence.value()),
                    bias: Some(signal.bias.as_str()),
                    entry: levels.map(|l| l.entry),
                    stop_loss: levels.map(|l| l.stop_loss),
                    take_profit_1: levels.map(|l| l.take_profit_1),
                    take_profit_2: levels.map(|l| l.take_profit_2),
                    error: None,
                }
            }
            SymbolOutcome::Failed {
                symbol, message, ..
            } => Self {
                symbol,
                status: "failed",
                timestamp: None,
                price: None,
                trend: None,
                momentum: None,
                atr: None,
                volume_flow: None,
                confidence: None,
                bias: None,
                entry: None,
                stop_loss: None,
                take_profit_1: None,
                take_profit_2: None,
                error: Some(message.as_str()),
            },
        }
    }
}

/// Serialize the whole report as pretty JSON.
pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize batch report to JSON")
}

/// Render the report as CSV, one row per symbol in batch order.
pub fn export_csv(report: &BatchReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for outcome in &report.outcomes {
        wtr.serialize(SignalRow::from_outcome(outcome))
            .with_context(|| format!("failed to write CSV row for {}", outcome.symbol()))?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Write `signals.json` and `signals.csv` into `output_dir`, creating it if
/// needed. Returns the two paths.
pub fn save_report(report: &BatchReport, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let json_path = output_dir.join(JSON_FILE);
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let csv_path = output_dir.join(CSV_FILE);
    std::fs::write(&csv_path, export_csv(report)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    Ok((json_path, csv_path))
}
