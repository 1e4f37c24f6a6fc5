//! Buffer → band → detector → trim.
//!
//! The analyzer snapshots a symbol's series, computes the band over the full
//! history, runs the crossing detector, then cuts the warm-up span from the
//! front so everything handed to a renderer is aligned and mostly defined.

use chrono::Duration;
use serde::Serialize;

use crate::buffer::SeriesBuffer;
use crate::config::{BandwatchConfig, ConfigError};
use crate::detector::{BandCrossingDetector, SideOffsets};
use crate::domain::{closes, BandSide, Bar, SignalMarker, SignalSeries};
use crate::error::BandwatchError;
use crate::indicators::{Band, BandIndicator};

/// Trimmed, aligned output for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub band: Band,
    pub upper_signals: SignalSeries,
    pub lower_signals: SignalSeries,
    pub offsets: SideOffsets,
    /// Bars removed from the front by the warm-up trim.
    pub trimmed: usize,
}

impl Analysis {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Both sides flattened into one time-ordered list.
    pub fn markers(&self) -> Vec<SignalMarker> {
        let mut markers: Vec<SignalMarker> = [
            (BandSide::Upper, &self.upper_signals),
            (BandSide::Lower, &self.lower_signals),
        ]
        .into_iter()
        .flat_map(|(side, series)| {
            series.events().filter_map(move |(i, marker)| {
                self.bars.get(i).map(|bar| SignalMarker {
                    timestamp: bar.timestamp,
                    side,
                    price: bar.close,
                    marker,
                })
            })
        })
        .collect();
        markers.sort_by_key(|m| m.timestamp);
        markers
    }
}

pub struct Analyzer {
    indicator: Box<dyn BandIndicator>,
    detector: BandCrossingDetector,
    trim: Duration,
    allow_partial: bool,
}

impl Analyzer {
    pub fn new(
        indicator: impl BandIndicator + 'static,
        detector: BandCrossingDetector,
        trim: Duration,
        allow_partial: bool,
    ) -> Self {
        Self {
            indicator: Box::new(indicator),
            detector,
            trim,
            allow_partial,
        }
    }

    /// Fails with `ConfigError::Invalid` rather than building from bad
    /// band parameters.
    pub fn from_config(config: &BandwatchConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.indicator()?,
            config.detector(),
            Duration::minutes(i64::from(config.analysis.trim_minutes)),
            config.analysis.allow_partial,
        ))
    }

    /// Bars needed before the band produces its first value.
    pub fn required_history(&self) -> usize {
        self.indicator.lookback() + 1
    }

    pub fn analyze(&self, buffer: &SeriesBuffer, symbol: &str) -> Result<Analysis, BandwatchError> {
        let bars = buffer.get(symbol)?;
        self.analyze_bars(symbol, bars)
    }

    pub fn analyze_bars(&self, symbol: &str, bars: Vec<Bar>) -> Result<Analysis, BandwatchError> {
        let need = self.required_history();
        if bars.len() < need && !self.allow_partial {
            return Err(BandwatchError::InsufficientHistory {
                symbol: symbol.to_string(),
                have: bars.len(),
                need,
            });
        }

        let closes = closes(&bars);
        let band = self.indicator.compute(&closes);
        let signals = self.detector.detect(&closes, &band);

        let kept: Vec<usize> = match bars.iter().map(|b| b.timestamp).min() {
            Some(earliest) => {
                let cutoff = earliest + self.trim;
                bars.iter()
                    .enumerate()
                    .filter(|(_, b)| b.timestamp >= cutoff)
                    .map(|(i, _)| i)
                    .collect()
            }
            None => Vec::new(),
        };
        let trimmed = bars.len() - kept.len();

        Ok(Analysis {
            symbol: symbol.to_string(),
            band: band.select(&kept),
            upper_signals: signals.upper.select(&kept),
            lower_signals: signals.lower.select(&kept),
            offsets: signals.offsets,
            bars: kept.iter().map(|&i| bars[i].clone()).collect(),
            trimmed,
        })
    }
}
