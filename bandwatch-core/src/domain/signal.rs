//! Sparse signal series and the markers extracted from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the band a crossing happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSide {
    Upper,
    Lower,
}

impl BandSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandSide::Upper => "upper",
            BandSide::Lower => "lower",
        }
    }
}

impl std::fmt::Display for BandSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A series aligned index-for-index with a close-price series.
///
/// `None` means "no event"; `Some(v)` is the marker value at the first bar of
/// a crossing episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    values: Vec<Option<f64>>,
}

impl SignalSeries {
    /// An all-"no event" series of length `len`.
    pub fn empty(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn push(&mut self, value: Option<f64>) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// `(index, marker)` for every event, in order.
    pub fn events(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|m| (i, m)))
    }

    pub fn event_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// The entries at `indices`, in that order. Out-of-range indices read
    /// as "no event".
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            values: indices.iter().map(|&i| self.get(i)).collect(),
        }
    }
}

/// One crossing event, flattened for display or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMarker {
    pub timestamp: DateTime<Utc>,
    pub side: BandSide,
    /// Raw close that breached the band.
    pub price: f64,
    /// Offset-adjusted marker value.
    pub marker: f64,
}
