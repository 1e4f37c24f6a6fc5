//! Bandwatch Core: bar buffer, band indicators, crossing detection, streaming.
//!
//! This crate contains everything behind the CLI:
//! - Domain types (bars, band sides, sparse signal series)
//! - Per-symbol append-only bar buffer shared across threads
//! - Bollinger band indicator behind a swappable trait
//! - Debounced band-crossing detector, batch and live
//! - Analysis pipeline with warm-up trim, CSV/JSON export
//! - Stream client and feed dispatcher thread
//! - TOML configuration with presets

pub mod analysis;
pub mod buffer;
pub mod config;
pub mod data;
pub mod detector;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod stream;

pub use analysis::{Analysis, Analyzer};
pub use buffer::{BufferError, IngestMode, SeriesBuffer};
pub use config::{BandwatchConfig, ConfigError};
pub use detector::{BandCrossingDetector, CrossingSignals, CrossingState, OffsetMode, SideOffsets};
pub use domain::{BandSide, Bar, SignalMarker, SignalSeries, Symbol};
pub use error::BandwatchError;
pub use indicators::{Band, BandIndicator, Bollinger};
pub use stream::{spawn_dispatcher, BarUpdate, FeedEvent, StreamClient};
