//! Incremental detection for bars arriving one at a time.
//!
//! Holds one tracker pair per symbol. Classification matches the batch pass
//! point for point once the tracker has been primed with the history that
//! preceded the live bars.

use std::collections::HashMap;

use crate::domain::{BandSide, Symbol};

use super::{CrossingState, CrossingTracker, SideOffsets};

#[derive(Debug, Clone)]
struct SymbolTrackers {
    upper: CrossingTracker,
    lower: CrossingTracker,
}

impl SymbolTrackers {
    fn new() -> Self {
        Self {
            upper: CrossingTracker::new(BandSide::Upper),
            lower: CrossingTracker::new(BandSide::Lower),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiveDetector {
    trackers: HashMap<Symbol, SymbolTrackers>,
}

impl LiveDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay history through the symbol's trackers without emitting, so the
    /// first live bar sees the state the batch pass would have reached.
    pub fn prime(&mut self, symbol: &str, closes: &[f64], upper: &[f64], lower: &[f64]) {
        let trackers = self
            .trackers
            .entry(symbol.to_string())
            .or_insert_with(SymbolTrackers::new);
        for (i, &price) in closes.iter().enumerate() {
            let up = upper.get(i).copied().unwrap_or(f64::NAN);
            let lo = lower.get(i).copied().unwrap_or(f64::NAN);
            trackers.upper.step(price, up, 0.0);
            trackers.lower.step(price, lo, 0.0);
        }
    }

    /// Classify one new point. Returns the markers it opened, upper first.
    pub fn observe(
        &mut self,
        symbol: &str,
        price: f64,
        upper: f64,
        lower: f64,
        offsets: SideOffsets,
    ) -> Vec<(BandSide, f64)> {
        let trackers = self
            .trackers
            .entry(symbol.to_string())
            .or_insert_with(SymbolTrackers::new);

        let mut markers = Vec::new();
        if let Some(m) = trackers.upper.step(price, upper, offsets.upper) {
            markers.push((BandSide::Upper, m));
        }
        if let Some(m) = trackers.lower.step(price, lower, offsets.lower) {
            markers.push((BandSide::Lower, m));
        }
        markers
    }

    /// Current state for a (symbol, side), if the symbol has been seen.
    pub fn state(&self, symbol: &str, side: BandSide) -> Option<CrossingState> {
        self.trackers.get(symbol).map(|t| match side {
            BandSide::Upper => t.upper.state(),
            BandSide::Lower => t.lower.state(),
        })
    }

    /// Forget a symbol's state.
    pub fn remove(&mut self, symbol: &str) {
        self.trackers.remove(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{detect_side, OffsetMode};

    #[test]
    fn matches_batch_after_priming() {
        let closes = [10.0, 12.0, 15.0, 14.0, 9.0, 8.0, 11.0, 16.0, 7.0];
        let upper = [13.0; 9];
        let lower = [9.0; 9];
        let offsets = OffsetMode::Fixed {
            upper: 0.0,
            lower: 0.0,
        }
        .resolve(&closes);

        let batch_upper = detect_side(BandSide::Upper, &closes, &upper, 0.0);
        let batch_lower = detect_side(BandSide::Lower, &closes, &lower, 0.0);

        // Seed with the first three points (inside an upper episode at index 2).
        let mut live = LiveDetector::new();
        live.prime("X", &closes[..3], &upper[..3], &lower[..3]);
        assert_eq!(live.state("X", BandSide::Upper), Some(CrossingState::Active));

        for i in 3..closes.len() {
            let markers = live.observe("X", closes[i], upper[i], lower[i], offsets);
            let got_upper = markers.iter().any(|(s, _)| *s == BandSide::Upper);
            let got_lower = markers.iter().any(|(s, _)| *s == BandSide::Lower);
            assert_eq!(got_upper, batch_upper.get(i).is_some(), "upper at {i}");
            assert_eq!(got_lower, batch_lower.get(i).is_some(), "lower at {i}");
        }
    }

    #[test]
    fn symbols_are_independent() {
        let mut live = LiveDetector::new();
        let offsets = SideOffsets::default();
        assert_eq!(live.observe("A", 20.0, 13.0, 9.0, offsets).len(), 1);
        assert_eq!(live.observe("B", 20.0, 13.0, 9.0, offsets).len(), 1);
        assert!(live.observe("A", 21.0, 13.0, 9.0, offsets).is_empty());
    }

    #[test]
    fn unknown_symbol_has_no_state() {
        let mut live = LiveDetector::new();
        assert_eq!(live.state("A", BandSide::Upper), None);
        live.observe("A", 10.0, 13.0, 9.0, SideOffsets::default());
        live.remove("A");
        assert_eq!(live.state("A", BandSide::Lower), None);
    }
}
