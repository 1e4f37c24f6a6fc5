//! Running relative range for the live path.
//!
//! Keeps the finite closes seen so far in sorted order, so each arrival costs
//! a binary search and one insert instead of a copy and a full sort.

/// Sorted multiset of finite values with `(max - min) / median` on demand.
#[derive(Debug, Clone, Default)]
pub struct RunningRange {
    sorted: Vec<f64>,
}

impl RunningRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self { sorted }
    }

    /// Add one value. Non-finite values are ignored.
    pub fn insert(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let at = self
            .sorted
            .partition_point(|v| v.total_cmp(&value).is_le());
        self.sorted.insert(at, value);
    }

    /// Finite values held.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Same value `relative_range` gives over every inserted value.
    pub fn relative_range(&self) -> f64 {
        sorted_relative_range(&self.sorted)
    }
}

/// `(max - min) / median` over an ascending slice of finite values.
pub(crate) fn sorted_relative_range(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    if median == 0.0 || !median.is_finite() {
        return 0.0;
    }
    (sorted[n - 1] - sorted[0]) / median
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::relative_range;

    #[test]
    fn incremental_matches_batch_at_every_step() {
        let values = [
            10.0,
            12.0,
            f64::NAN,
            15.0,
            14.0,
            9.0,
            f64::INFINITY,
            8.0,
            11.0,
            11.0,
            7.5,
        ];
        let mut running = RunningRange::new();
        for (i, &value) in values.iter().enumerate() {
            running.insert(value);
            let batch = relative_range(&values[..=i]);
            assert!(
                (running.relative_range() - batch).abs() < 1e-12,
                "step {i}: running={}, batch={batch}",
                running.relative_range()
            );
        }
        assert_eq!(running.len(), 9);
    }

    #[test]
    fn seeded_then_extended() {
        let mut running = RunningRange::from_values(&[4.0, 1.0, f64::NAN, 3.0]);
        assert_eq!(running.len(), 3);
        running.insert(2.0);
        // sorted 1,2,3,4: median 2.5, range 3
        assert!((running.relative_range() - 3.0 / 2.5).abs() < 1e-12);
    }

    #[test]
    fn empty_and_zero_median_are_zero() {
        assert_eq!(RunningRange::new().relative_range(), 0.0);
        assert!(RunningRange::new().is_empty());
        assert_eq!(RunningRange::from_values(&[-1.0, 0.0, 1.0]).relative_range(), 0.0);
    }
}
