//! Subscription bookkeeping and the bar-arrival loop.
//!
//! `StreamClient` owns the set of active subscriptions and a handle to the
//! shared buffer. Each arriving bar triggers exactly one append, then live
//! classification of the new point. The dispatcher thread drains an `mpsc`
//! channel so arrivals are handled one at a time, in channel order.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::buffer::{BufferError, SeriesBuffer};
use crate::config::{BandwatchConfig, ConfigError};
use crate::data::provider::BarFeed;
use crate::detector::{LiveDetector, OffsetMode, RunningRange};
use crate::domain::{BandSide, Bar, Symbol};
use crate::error::BandwatchError;
use crate::indicators::BandIndicator;

/// Events delivered by a live feed.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Bar { symbol: Symbol, bar: Bar },
    Stop { symbol: Symbol },
    Shutdown,
}

/// What happened when one bar arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct BarUpdate {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    /// Bars actually appended (0 when dropped or not subscribed).
    pub appended: usize,
    /// Crossing episodes opened by this bar.
    pub markers: Vec<(BandSide, f64)>,
}

pub struct StreamClient {
    buffer: Arc<SeriesBuffer>,
    indicator: Box<dyn BandIndicator>,
    offset: OffsetMode,
    live: LiveDetector,
    /// Per-symbol close range for adaptive offsets.
    ranges: HashMap<Symbol, RunningRange>,
    active: HashSet<Symbol>,
}

impl StreamClient {
    pub fn new(buffer: Arc<SeriesBuffer>, config: &BandwatchConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_indicator(buffer, config.indicator()?, config.offset))
    }

    pub fn with_indicator(
        buffer: Arc<SeriesBuffer>,
        indicator: impl BandIndicator + 'static,
        offset: OffsetMode,
    ) -> Self {
        Self {
            buffer,
            indicator: Box::new(indicator),
            offset,
            live: LiveDetector::new(),
            ranges: HashMap::new(),
            active: HashSet::new(),
        }
    }

    pub fn buffer(&self) -> &Arc<SeriesBuffer> {
        &self.buffer
    }

    pub fn is_streaming(&self, symbol: &str) -> bool {
        self.active.contains(symbol)
    }

    /// Active subscriptions, sorted.
    pub fn streaming_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.active.iter().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Subscribe to a symbol, seeding the buffer with its starting history.
    ///
    /// Fails with `AlreadyStreaming` if the symbol is subscribed or already
    /// has buffered bars.
    pub fn start_stream(&mut self, symbol: &str, initial: Vec<Bar>) -> Result<(), BandwatchError> {
        if self.active.contains(symbol) || self.buffer.contains(symbol) {
            return Err(BufferError::AlreadyStreaming {
                symbol: symbol.to_string(),
            }
            .into());
        }

        let seeded = self.buffer.seed(symbol, initial)?;

        let closes = self.buffer.closes(symbol)?;
        let band = self.indicator.compute(&closes);
        self.live.prime(symbol, &closes, &band.upper, &band.lower);
        if self.offset.is_adaptive() {
            self.ranges
                .insert(symbol.to_string(), RunningRange::from_values(&closes));
        }
        self.active.insert(symbol.to_string());

        info!(symbol, seeded, "stream started");
        Ok(())
    }

    /// Backfill from a feed, then subscribe.
    pub fn start_stream_from(
        &mut self,
        feed: &dyn BarFeed,
        symbol: &str,
        lookback: Duration,
    ) -> Result<(), BandwatchError> {
        if self.active.contains(symbol) || self.buffer.contains(symbol) {
            return Err(BufferError::AlreadyStreaming {
                symbol: symbol.to_string(),
            }
            .into());
        }
        let history = feed.backfill(symbol, lookback)?;
        debug!(symbol, feed = feed.name(), bars = history.len(), "backfill fetched");
        self.start_stream(symbol, history)
    }

    /// Unsubscribe. The buffered series stays queryable.
    pub fn stop_stream(&mut self, symbol: &str) -> Result<(), BandwatchError> {
        if !self.active.remove(symbol) {
            return Err(BandwatchError::NotStreaming {
                symbol: symbol.to_string(),
            });
        }
        info!(symbol, "stream stopped");
        Ok(())
    }

    /// Bar-arrival handler: one append, then live classification.
    pub fn on_bar(&mut self, symbol: &str, bar: Bar) -> Result<BarUpdate, BandwatchError> {
        let mut update = BarUpdate {
            symbol: symbol.to_string(),
            timestamp: bar.timestamp,
            appended: 0,
            markers: Vec::new(),
        };

        if !self.active.contains(symbol) {
            debug!(symbol, timestamp = %bar.timestamp, "ignoring bar for unsubscribed symbol");
            return Ok(update);
        }

        let price = bar.close;
        update.appended = self.buffer.push(symbol, bar)?;
        if update.appended == 0 {
            return Ok(update);
        }

        let volatility = match self.ranges.get_mut(symbol) {
            Some(range) => {
                range.insert(price);
                range.relative_range()
            }
            None => 0.0,
        };
        let offsets = self.offset.scaled(volatility);
        let window = self
            .buffer
            .tail_closes(symbol, self.indicator.lookback() + 1)?;
        let band = self.indicator.compute(&window);
        let upper = band.upper.last().copied().unwrap_or(f64::NAN);
        let lower = band.lower.last().copied().unwrap_or(f64::NAN);

        update.markers = self.live.observe(symbol, price, upper, lower, offsets);
        for (side, marker) in &update.markers {
            info!(
                symbol,
                side = %side,
                price,
                marker = *marker,
                timestamp = %update.timestamp,
                "band crossing"
            );
        }
        Ok(update)
    }

    /// Route one feed event. Only bar events produce an update.
    pub fn handle(&mut self, event: FeedEvent) -> Result<Option<BarUpdate>, BandwatchError> {
        match event {
            FeedEvent::Bar { symbol, bar } => self.on_bar(&symbol, bar).map(Some),
            FeedEvent::Stop { symbol } => self.stop_stream(&symbol).map(|_| None),
            FeedEvent::Shutdown => Ok(None),
        }
    }
}

/// Spawn the arrival loop on its own thread.
///
/// Runs until a `Shutdown` event arrives or every sender is dropped, then
/// hands the client back through the join handle. Updates that opened a
/// crossing are forwarded on `updates` when given.
pub fn spawn_dispatcher(
    mut client: StreamClient,
    rx: Receiver<FeedEvent>,
    updates: Option<Sender<BarUpdate>>,
) -> std::io::Result<JoinHandle<StreamClient>> {
    thread::Builder::new()
        .name("bandwatch-dispatch".into())
        .spawn(move || {
            while let Ok(event) = rx.recv() {
                if matches!(event, FeedEvent::Shutdown) {
                    break;
                }
                match client.handle(event) {
                    Ok(Some(update)) if !update.markers.is_empty() => {
                        if let Some(tx) = &updates {
                            // Receiver gone just means nobody is listening.
                            let _ = tx.send(update);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "feed event rejected"),
                }
            }
            debug!("dispatcher exiting");
            client
        })
}
