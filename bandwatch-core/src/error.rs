//! Crate-level error type.
//!
//! All variants are local, recoverable conditions surfaced to the caller.
//! The detector itself never produces one.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::config::ConfigError;
use crate::data::provider::FeedError;

#[derive(Debug, Error)]
pub enum BandwatchError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("symbol '{symbol}' is not streaming; start the stream before stopping it")]
    NotStreaming { symbol: String },

    #[error(
        "insufficient history for '{symbol}': {have} bars buffered, {need} needed to clear the band warm-up"
    )]
    InsufficientHistory {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("export failed: {0}")]
    Export(String),
}

impl BandwatchError {
    /// The symbol the error is about, when there is one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            BandwatchError::Buffer(BufferError::UnknownSymbol { symbol })
            | BandwatchError::Buffer(BufferError::AlreadyStreaming { symbol })
            | BandwatchError::Buffer(BufferError::OutOfOrder { symbol, .. })
            | BandwatchError::NotStreaming { symbol }
            | BandwatchError::InsufficientHistory { symbol, .. } => Some(symbol),
            BandwatchError::Feed(FeedError::SymbolNotFound { symbol }) => Some(symbol),
            _ => None,
        }
    }
}
