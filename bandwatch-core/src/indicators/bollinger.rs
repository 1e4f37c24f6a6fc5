//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, window)
//! - Upper: middle + deviation * stddev(close, window)
//! - Lower: middle - deviation * stddev(close, window)
//!
//! Uses population stddev (divide by N).
//! Lookback: window - 1.

use super::{Band, BandIndicator};

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    deviation: f64,
    name: String,
}

impl Bollinger {
    pub fn new(window: usize, deviation: f64) -> Self {
        assert!(window >= 1, "Bollinger window must be >= 1");
        assert!(
            deviation > 0.0 && deviation.is_finite(),
            "Bollinger deviation must be positive and finite"
        );
        Self {
            window,
            deviation,
            name: format!("bollinger_{window}_{deviation}"),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn deviation(&self) -> f64 {
        self.deviation
    }
}

impl BandIndicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Band {
        let n = closes.len();
        let mut band = Band::missing(n);

        if n < self.window {
            return band;
        }

        for i in (self.window - 1)..n {
            let window = &closes[i + 1 - self.window..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }

            let mean = window.iter().sum::<f64>() / self.window as f64;
            let variance = window
                .iter()
                .map(|c| {
                    let diff = c - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.window as f64;
            let width = self.deviation * variance.sqrt();

            band.middle[i] = mean;
            band.upper[i] = mean + width;
            band.lower[i] = mean - width;
        }

        band
    }
}
