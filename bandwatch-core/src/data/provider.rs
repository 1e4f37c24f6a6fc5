//! Bar feed trait and structured error types.
//!
//! The BarFeed trait abstracts over market-data sources (CSV files, the
//! synthetic generator, a live vendor client) so the stream client can be
//! driven by any of them and mocked in tests.

use chrono::Duration;
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bad bar at row {row}: {reason}")]
    BadRow { row: usize, reason: String },

    #[error("feed error: {0}")]
    Other(String),
}

/// Market-data collaborator.
///
/// Implementations deliver bars with UTC timestamps, in time order. The
/// buffer does not reorder what it is given.
pub trait BarFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Historical bars covering `lookback` up to the feed's most recent bar.
    fn backfill(&self, symbol: &str, lookback: Duration) -> Result<Vec<Bar>, FeedError>;
}
