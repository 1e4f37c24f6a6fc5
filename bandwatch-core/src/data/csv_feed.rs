//! CSV bar files.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps are
//! RFC 3339 with any offset and are converted to UTC on load.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::provider::{BarFeed, FeedError};
use crate::domain::{Bar, Symbol};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse bars from any CSV reader, preserving file order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // Header is line 1, so data row i sits on line i + 2.
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| FeedError::BadRow {
                row: i + 2,
                reason: format!("timestamp '{}': {e}", row.timestamp),
            })?
            .with_timezone(&Utc);
        bars.push(Bar::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }
    Ok(bars)
}

pub fn read_bars_from_path(path: &Path) -> Result<Vec<Bar>, FeedError> {
    let file = std::fs::File::open(path)?;
    read_bars(file)
}

/// Feed backed by bars loaded from CSV files, one file per symbol.
#[derive(Debug, Default)]
pub struct CsvFeed {
    series: HashMap<Symbol, Vec<Bar>>,
}

impl CsvFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, symbol: &str, path: &Path) -> Result<usize, FeedError> {
        let bars = read_bars_from_path(path)?;
        let count = bars.len();
        self.series.insert(symbol.to_string(), bars);
        Ok(count)
    }

    pub fn insert(&mut self, symbol: &str, bars: Vec<Bar>) {
        self.series.insert(symbol.to_string(), bars);
    }

    /// Every bar loaded for the symbol.
    pub fn bars(&self, symbol: &str) -> Result<&[Bar], FeedError> {
        self.series
            .get(symbol)
            .map(|v| v.as_slice())
            .ok_or_else(|| FeedError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

impl BarFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn backfill(&self, symbol: &str, lookback: Duration) -> Result<Vec<Bar>, FeedError> {
        let bars = self.bars(symbol)?;
        let Some(latest) = bars.iter().map(|b| b.timestamp).max() else {
            return Ok(Vec::new());
        };
        let start = latest - lookback;
        Ok(bars
            .iter()
            .filter(|b| b.timestamp >= start)
            .cloned()
            .collect())
    }
}
