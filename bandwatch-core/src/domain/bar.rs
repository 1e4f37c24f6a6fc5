//! A single OHLCV bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at one sampling interval.
///
/// Timestamps are normalized to UTC by the feed that produced the bar, so a
/// symbol's series never mixes offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

/// Close prices of a bar slice, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn complete_bar_is_not_void() {
        assert!(!sample_bar().is_void());
    }

    #[test]
    fn any_missing_price_is_void() {
        for field in 0..4 {
            let mut bar = sample_bar();
            match field {
                0 => bar.open = f64::NAN,
                1 => bar.high = f64::NAN,
                2 => bar.low = f64::NAN,
                _ => bar.close = f64::NAN,
            }
            assert!(bar.is_void(), "field {field}");
        }
    }

    #[test]
    fn missing_volume_is_not_void() {
        // Only prices feed the bands.
        let mut bar = sample_bar();
        bar.volume = f64::NAN;
        assert!(!bar.is_void());
    }

    #[test]
    fn closes_preserve_order() {
        let mut second = sample_bar();
        second.close = 104.5;
        assert_eq!(closes(&[sample_bar(), second]), vec![103.0, 104.5]);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
