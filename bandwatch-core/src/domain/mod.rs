//! Domain types for Bandwatch

pub mod bar;
pub mod signal;

pub use bar::{closes, Bar};
pub use signal::{BandSide, SignalMarker, SignalSeries};

/// Symbol type alias
pub type Symbol = String;
