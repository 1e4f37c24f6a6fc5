//! One side's crossing state machine.
//!
//! ```text
//!            breach (emit marker)
//!   Inactive ───────────────────▶ Active
//!      ▲                            │
//!      └────────────────────────────┘
//!            first non-breach
//! ```
//!
//! A missing band value (or price) is neither a breach nor a non-breach: it
//! leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::domain::BandSide;

/// Whether a side is currently inside a crossing episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingState {
    #[default]
    Inactive,
    Active,
}

/// Strict breach test. Ties and NaN never count.
pub fn is_breach(side: BandSide, price: f64, band: f64) -> bool {
    // Comparisons against NaN are false, so NaN falls out as "not breached".
    match side {
        BandSide::Upper => price > band,
        BandSide::Lower => price < band,
    }
}

/// Offset-adjusted marker value. Upper markers sit above the price, lower
/// markers below.
pub fn marker_value(side: BandSide, price: f64, offset: f64) -> f64 {
    match side {
        BandSide::Upper => price * (1.0 + offset),
        BandSide::Lower => price * (1.0 - offset),
    }
}

#[derive(Debug, Clone)]
pub struct CrossingTracker {
    side: BandSide,
    state: CrossingState,
}

impl CrossingTracker {
    pub fn new(side: BandSide) -> Self {
        Self {
            side,
            state: CrossingState::Inactive,
        }
    }

    pub fn side(&self) -> BandSide {
        self.side
    }

    pub fn state(&self) -> CrossingState {
        self.state
    }

    /// Feed one point. Returns the marker if this point opens a new episode.
    pub fn step(&mut self, price: f64, band: f64, offset: f64) -> Option<f64> {
        if price.is_nan() || band.is_nan() {
            return None;
        }

        let breached = is_breach(self.side, price, band);
        match (self.state, breached) {
            (CrossingState::Inactive, true) => {
                self.state = CrossingState::Active;
                Some(marker_value(self.side, price, offset))
            }
            (CrossingState::Active, false) => {
                self.state = CrossingState::Inactive;
                None
            }
            _ => None,
        }
    }
}
