//! Deterministic synthetic bars for demos and tests.
//!
//! Each symbol gets its own random walk seeded from the BLAKE3 hash of its
//! name, so the same symbol always produces the same bars.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{BarFeed, FeedError};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    /// Timestamp of the last bar a backfill returns.
    pub end: DateTime<Utc>,
    pub interval: Duration,
    pub start_price: f64,
    /// Maximum absolute per-bar return.
    pub max_step: f64,
}

impl SyntheticFeed {
    pub fn new(end: DateTime<Utc>) -> Self {
        Self {
            end,
            interval: Duration::minutes(1),
            start_price: 100.0,
            max_step: 0.004,
        }
    }

    /// `count` bars for the symbol, the first stamped `start`.
    pub fn generate(&self, symbol: &str, start: DateTime<Utc>, count: usize) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::with_capacity(count);
        let mut price = self.start_price;
        let mut timestamp = start;

        for _ in 0..count {
            let step: f64 = rng.gen_range(-self.max_step..self.max_step);
            let open = price;
            let close = price * (1.0 + step);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..self.max_step / 2.0));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..self.max_step / 2.0));
            let volume: f64 = rng.gen_range(0.01..5.0);

            bars.push(Bar::new(timestamp, open, high, low, close, volume));

            price = close;
            timestamp += self.interval;
        }

        bars
    }
}

impl BarFeed for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn backfill(&self, symbol: &str, lookback: Duration) -> Result<Vec<Bar>, FeedError> {
        let interval_secs = self.interval.num_seconds();
        if interval_secs <= 0 {
            return Err(FeedError::Other("synthetic interval must be positive".into()));
        }
        let steps = (lookback.num_seconds() / interval_secs).max(0);
        // steps * interval <= lookback.
        let start = self
            .end
            .checked_sub_signed(Duration::seconds(steps * interval_secs))
            .ok_or_else(|| {
                FeedError::Other(format!("lookback {lookback} reaches past the calendar"))
            })?;
        let count = usize::try_from(steps)
            .map_err(|_| FeedError::Other(format!("lookback {lookback} is too long")))?
            + 1;
        Ok(self.generate(symbol, start, count))
    }
}
