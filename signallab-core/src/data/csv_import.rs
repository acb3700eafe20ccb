//! CSV directory provider.
//!
//! Reads `<dir>/<symbol>.csv` (a `/` in the symbol becomes `_`, so
//! `XAU/USD` reads `XAU_USD.csv`). Columns are matched by header name;
//! extra columns are ignored and `volume` is optional. Files may be in
//! either time order; the newest `count` rows are kept.

use super::provider::{BarRequest, MarketDataProvider, ProviderError, RawBar, RawField};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp", alias = "time", alias = "date", alias = "Date")]
    datetime: Option<String>,
    #[serde(alias = "Open")]
    open: Option<String>,
    #[serde(alias = "High")]
    high: Option<String>,
    #[serde(alias = "Low")]
    low: Option<String>,
    #[serde(alias = "Close")]
    close: Option<String>,
    #[serde(default, alias = "Volume")]
    volume: Option<String>,
}

impl From<CsvRow> for RawBar {
    fn from(row: CsvRow) -> Self {
        RawBar {
            timestamp: row.datetime.map(RawField::Text),
            open: row.open.map(RawField::Text),
            high: row.high.map(RawField::Text),
            low: row.low.map(RawField::Text),
            close: row.close.map(RawField::Text),
            volume: row.volume.map(RawField::Text),
        }
    }
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.replace('/', "_")))
    }

    fn read_rows(path: &Path) -> Result<Vec<RawBar>, ProviderError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ProviderError::Io(format!("{}: {e}", path.display())))?;

        reader
            .deserialize::<CsvRow>()
            .map(|row| {
                row.map(RawBar::from)
                    .map_err(|e| ProviderError::MalformedPayload(format!("{}: {e}", path.display())))
            })
            .collect()
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError> {
        let path = self.path_for(&request.symbol);
        if !path.exists() {
            return Err(ProviderError::NotFound {
                symbol: request.symbol.clone(),
            });
        }

        let mut rows = Self::read_rows(&path)?;
        if rows.is_empty() {
            return Err(ProviderError::EmptyPayload);
        }
        // Rows with an unreadable timestamp sort first and are trimmed first;
        // the validator drops any that survive.
        rows.sort_by_key(|row| row.timestamp.as_ref().and_then(|t| t.coerce_timestamp()));
        if rows.len() > request.count {
            rows.drain(..rows.len() - request.count);
        }
        debug!(symbol = %request.symbol, rows = rows.len(), path = %path.display(), "read csv");
        Ok(rows)
    }
}
