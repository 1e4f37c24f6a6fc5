//! Band-crossing detector.
//!
//! Turns a close series and an aligned band into two sparse signal series,
//! one per side, with one marker per crossing episode. Classification always
//! uses the raw close against the raw band; the offset only moves the
//! reported marker value.
//!
//! The detector never fails on data quality: short series, missing band
//! values and mismatched lengths all degrade to "no event".

pub mod live;
pub mod range;
pub mod tracker;

pub use live::LiveDetector;
pub use range::RunningRange;
pub use tracker::{is_breach, marker_value, CrossingState, CrossingTracker};

use serde::{Deserialize, Serialize};

use crate::domain::{BandSide, SignalSeries};
use crate::indicators::Band;

/// How far markers are pushed away from the breaching price.
///
/// `Fixed` uses constant fractions per side. `Adaptive` scales a per-side
/// constant by the window's relative range: `k * (max - min) / median`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OffsetMode {
    Fixed { upper: f64, lower: f64 },
    Adaptive { upper_k: f64, lower_k: f64 },
}

impl Default for OffsetMode {
    fn default() -> Self {
        OffsetMode::Adaptive {
            upper_k: 0.05,
            lower_k: 0.08,
        }
    }
}

impl OffsetMode {
    /// Concrete per-side offsets for this close window.
    pub fn resolve(&self, closes: &[f64]) -> SideOffsets {
        match *self {
            OffsetMode::Fixed { upper, lower } => SideOffsets { upper, lower },
            OffsetMode::Adaptive { .. } => self.scaled(relative_range(closes)),
        }
    }

    /// Offsets for an already known relative range. `Fixed` ignores it.
    pub fn scaled(&self, volatility: f64) -> SideOffsets {
        match *self {
            OffsetMode::Fixed { upper, lower } => SideOffsets { upper, lower },
            OffsetMode::Adaptive { upper_k, lower_k } => SideOffsets {
                upper: upper_k * volatility,
                lower: lower_k * volatility,
            },
        }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, OffsetMode::Adaptive { .. })
    }
}

/// Resolved offsets for one detector call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideOffsets {
    pub upper: f64,
    pub lower: f64,
}

impl SideOffsets {
    pub fn for_side(&self, side: BandSide) -> f64 {
        match side {
            BandSide::Upper => self.upper,
            BandSide::Lower => self.lower,
        }
    }
}

/// `(max - min) / median` over the finite values. Zero when undefined.
pub fn relative_range(values: &[f64]) -> f64 {
    RunningRange::from_values(values).relative_range()
}

/// Output of one detector pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingSignals {
    pub upper: SignalSeries,
    pub lower: SignalSeries,
    pub offsets: SideOffsets,
}

impl CrossingSignals {
    pub fn side(&self, side: BandSide) -> &SignalSeries {
        match side {
            BandSide::Upper => &self.upper,
            BandSide::Lower => &self.lower,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BandCrossingDetector {
    offset: OffsetMode,
}

impl BandCrossingDetector {
    pub fn new(offset: OffsetMode) -> Self {
        Self { offset }
    }

    pub fn offset_mode(&self) -> OffsetMode {
        self.offset
    }

    /// Run both sides over the full series.
    pub fn detect(&self, closes: &[f64], band: &Band) -> CrossingSignals {
        let offsets = self.offset.resolve(closes);
        CrossingSignals {
            upper: detect_side(BandSide::Upper, closes, &band.upper, offsets.upper),
            lower: detect_side(BandSide::Lower, closes, &band.lower, offsets.lower),
            offsets,
        }
    }
}

/// One side's pass. Output length always equals `closes.len()`.
pub fn detect_side(side: BandSide, closes: &[f64], band: &[f64], offset: f64) -> SignalSeries {
    let n = closes.len();
    if n < 2 {
        return SignalSeries::empty(n);
    }

    let mut tracker = CrossingTracker::new(side);
    let mut out = SignalSeries::empty(0);
    for (i, &price) in closes.iter().enumerate() {
        let level = band.get(i).copied().unwrap_or(f64::NAN);
        out.push(tracker.step(price, level, offset));
    }
    out
}
