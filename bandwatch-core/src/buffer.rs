//! Per-symbol append-only bar buffer.
//!
//! One `SeriesBuffer` is constructed by the caller and shared by handle
//! (`Arc<SeriesBuffer>`) with every component that needs it. The outer map is
//! behind an `RwLock`; each symbol's series sits behind its own `Mutex`, so
//! appends to one symbol are serialized while other symbols proceed
//! independently.
//!
//! Series only grow. A snapshot returned by [`SeriesBuffer::get`] is always a
//! prefix of every later snapshot of the same symbol.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Bar, Symbol};

/// Errors from buffer queries and mutations. Every variant names the symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    #[error("unknown symbol '{symbol}'")]
    UnknownSymbol { symbol: String },

    #[error("symbol '{symbol}' is already streaming; stop the stream before starting it again")]
    AlreadyStreaming { symbol: String },

    #[error("out-of-order bar for '{symbol}': {timestamp} is not after {tail}")]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
        tail: DateTime<Utc>,
    },
}

/// How incoming bars are checked against the existing tail.
///
/// Void bars (a missing open, high, low or close) are dropped and logged in
/// every mode before the ordering check runs.
///
/// - `Raw`: concatenate exactly as delivered. Duplicates and disorder pass
///   through untouched.
/// - `Strict`: reject the whole chunk if any bar is not strictly after the one
///   before it (including the buffered tail). Nothing is appended.
/// - `Tolerant`: drop bars that are not strictly after the running tail and
///   append the rest. History is never reordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    #[default]
    Raw,
    Strict,
    Tolerant,
}

type SharedSeries = Arc<Mutex<Vec<Bar>>>;

/// Process-wide map from symbol to its growing bar series.
#[derive(Debug, Default)]
pub struct SeriesBuffer {
    mode: IngestMode,
    series: RwLock<HashMap<Symbol, SharedSeries>>,
}

impl SeriesBuffer {
    pub fn new(mode: IngestMode) -> Self {
        Self {
            mode,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> IngestMode {
        self.mode
    }

    /// Install a symbol's starting history.
    ///
    /// Fails with `AlreadyStreaming` if the symbol already has an entry:
    /// two independent histories are never merged implicitly.
    pub fn seed(&self, symbol: &str, bars: Vec<Bar>) -> Result<usize, BufferError> {
        let bars = self.admit(symbol, None, bars)?;
        let count = bars.len();

        let mut map = self.series.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(symbol) {
            return Err(BufferError::AlreadyStreaming {
                symbol: symbol.to_string(),
            });
        }
        map.insert(symbol.to_string(), Arc::new(Mutex::new(bars)));

        debug!(symbol, bars = count, "seeded series");
        Ok(count)
    }

    /// Append one or more bars after the symbol's tail, creating the entry if
    /// needed. Returns the number of bars actually appended.
    pub fn append<I>(&self, symbol: &str, bars: I) -> Result<usize, BufferError>
    where
        I: IntoIterator<Item = Bar>,
    {
        let bars: Vec<Bar> = bars.into_iter().collect();
        let entry = self.entry_or_insert(symbol);
        let mut series = lock_series(&entry);

        let tail = series.last().map(|b| b.timestamp);
        let admitted = self.admit(symbol, tail, bars)?;
        let count = admitted.len();
        series.extend(admitted);

        debug!(symbol, appended = count, len = series.len(), "appended bars");
        Ok(count)
    }

    /// Append a single bar.
    pub fn push(&self, symbol: &str, bar: Bar) -> Result<usize, BufferError> {
        self.append(symbol, std::iter::once(bar))
    }

    /// Owned snapshot of the symbol's full series.
    pub fn get(&self, symbol: &str) -> Result<Vec<Bar>, BufferError> {
        let entry = self.lookup(symbol)?;
        let series = lock_series(&entry);
        Ok(series.clone())
    }

    /// Close prices of the symbol's series.
    pub fn closes(&self, symbol: &str) -> Result<Vec<f64>, BufferError> {
        let entry = self.lookup(symbol)?;
        let series = lock_series(&entry);
        Ok(series.iter().map(|b| b.close).collect())
    }

    /// Close prices of the last `n` bars, or all of them if fewer are buffered.
    pub fn tail_closes(&self, symbol: &str, n: usize) -> Result<Vec<f64>, BufferError> {
        let entry = self.lookup(symbol)?;
        let series = lock_series(&entry);
        let start = series.len().saturating_sub(n);
        Ok(series[start..].iter().map(|b| b.close).collect())
    }

    /// Minimum timestamp in the buffered series.
    ///
    /// This is the minimum, not the first element: under `Raw` ingestion the
    /// series may be out of order.
    pub fn earliest_timestamp(&self, symbol: &str) -> Result<DateTime<Utc>, BufferError> {
        let entry = self.lookup(symbol)?;
        let series = lock_series(&entry);
        series
            .iter()
            .map(|b| b.timestamp)
            .min()
            .ok_or_else(|| BufferError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(symbol)
    }

    /// Number of buffered bars for the symbol.
    pub fn len(&self, symbol: &str) -> Result<usize, BufferError> {
        let entry = self.lookup(symbol)?;
        let len = lock_series(&entry).len();
        Ok(len)
    }

    /// All buffered symbols, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
        let mut symbols: Vec<Symbol> = map.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    fn lookup(&self, symbol: &str) -> Result<SharedSeries, BufferError> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .cloned()
            .ok_or_else(|| BufferError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    fn entry_or_insert(&self, symbol: &str) -> SharedSeries {
        if let Some(entry) = self
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
        {
            return Arc::clone(entry);
        }
        let mut map = self.series.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(symbol.to_string()).or_default())
    }

    fn admit(
        &self,
        symbol: &str,
        tail: Option<DateTime<Utc>>,
        bars: Vec<Bar>,
    ) -> Result<Vec<Bar>, BufferError> {
        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|bar| {
                if bar.is_void() {
                    warn!(symbol, timestamp = %bar.timestamp, "dropping void bar");
                }
                !bar.is_void()
            })
            .collect();

        match self.mode {
            IngestMode::Raw => Ok(bars),
            IngestMode::Strict => {
                let mut last = tail;
                for bar in &bars {
                    if let Some(prev) = last {
                        if bar.timestamp <= prev {
                            return Err(BufferError::OutOfOrder {
                                symbol: symbol.to_string(),
                                timestamp: bar.timestamp,
                                tail: prev,
                            });
                        }
                    }
                    last = Some(bar.timestamp);
                }
                Ok(bars)
            }
            IngestMode::Tolerant => {
                let mut last = tail;
                let mut kept = Vec::with_capacity(bars.len());
                for bar in bars {
                    match last {
                        Some(prev) if bar.timestamp <= prev => {
                            warn!(
                                symbol,
                                timestamp = %bar.timestamp,
                                tail = %prev,
                                "dropping out-of-order bar"
                            );
                        }
                        _ => {
                            last = Some(bar.timestamp);
                            kept.push(bar);
                        }
                    }
                }
                Ok(kept)
            }
        }
    }
}

fn lock_series(entry: &SharedSeries) -> MutexGuard<'_, Vec<Bar>> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
