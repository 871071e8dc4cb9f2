//! Probability that a floating rupture touches each segment of a fault.

use serde::{Deserialize, Serialize};

/// Number of evenly spaced positions sampled along the fault.
pub const NUM_OBSERVATION_POINTS: usize = 100;

/// Per-segment coverage of a floating rupture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentOverlap {
    /// Mean probability that a point of the segment lies inside the rupture.
    pub observation: Vec<f64>,
    /// Observation normalized to sum to one.
    pub share: Vec<f64>,
}

/// Probability that a uniformly placed rupture of length `rup_length`
/// covers position `x` on a fault of length `total_length`.
pub fn observation_probability(x: f64, total_length: f64, rup_length: f64) -> f64 {
    if rup_length >= total_length {
        return 1.0;
    }
    let span = total_length - rup_length;
    if rup_length < total_length / 2.0 {
        if x < rup_length {
            x / span
        } else if x <= span {
            rup_length / span
        } else {
            (total_length - x) / span
        }
    } else if x < span {
        x / span
    } else if x <= rup_length {
        1.0
    } else {
        (total_length - x) / span
    }
}

/// Averages the observation curve over each segment.
///
/// # Arguments
/// * `bounds` - `(start, end)` along-strike distance of each segment in km
/// * `total_length` - Fault length in km
/// * `rup_length` - Rupture length in km
pub fn segment_overlap(bounds: &[(f64, f64)], total_length: f64, rup_length: f64) -> SegmentOverlap {
    let last = NUM_OBSERVATION_POINTS - 1;
    let dx = total_length / last as f64;
    let curve: Vec<f64> = (0..NUM_OBSERVATION_POINTS)
        .map(|i| observation_probability(i as f64 * dx, total_length, rup_length))
        .collect();

    let observation: Vec<f64> = bounds
        .iter()
        .map(|&(start, end)| {
            if dx <= 0.0 {
                return observation_probability(0.0, total_length, rup_length);
            }
            let first = (start / dx).ceil().max(0.0) as usize;
            let last_index = ((end / dx).floor().max(0.0) as usize).min(last);
            if first > last_index {
                observation_probability((start + end) / 2.0, total_length, rup_length)
            } else {
                let samples = &curve[first..=last_index];
                samples.iter().sum::<f64>() / samples.len() as f64
            }
        })
        .collect();

    let total: f64 = observation.iter().sum();
    let share = observation
        .iter()
        .map(|&p| if total > 0.0 { p / total } else { 0.0 })
        .collect();

    SegmentOverlap { observation, share }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal_bounds(k: usize, length: f64) -> Vec<(f64, f64)> {
        let seg = length / k as f64;
        (0..k).map(|i| (i as f64 * seg, (i + 1) as f64 * seg)).collect()
    }

    #[test]
    fn test_full_fault_rupture_splits_evenly() {
        for k in [1, 2, 3, 5] {
            let overlap = segment_overlap(&equal_bounds(k, 120.0), 120.0, 120.0);
            for (obs, share) in overlap.observation.iter().zip(&overlap.share) {
                assert!((obs - 1.0).abs() < 1e-12);
                assert!((share - 1.0 / k as f64).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_short_rupture_trapezoid() {
        let t = 100.0;
        let l = 20.0;
        assert_eq!(observation_probability(0.0, t, l), 0.0);
        assert!((observation_probability(10.0, t, l) - 0.125).abs() < 1e-12);
        assert!((observation_probability(50.0, t, l) - 0.25).abs() < 1e-12);
        assert!((observation_probability(90.0, t, l) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_long_rupture_plateau() {
        let t = 100.0;
        let l = 70.0;
        assert!((observation_probability(15.0, t, l) - 0.5).abs() < 1e-12);
        assert_eq!(observation_probability(50.0, t, l), 1.0);
        assert!((observation_probability(85.0, t, l) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_middle_segment_sees_more_ruptures() {
        // 99 km puts the samples on whole kilometres.
        let overlap = segment_overlap(&equal_bounds(3, 99.0), 99.0, 20.0);
        assert!(overlap.observation[1] > overlap.observation[0]);
        assert!((overlap.observation[0] - overlap.observation[2]).abs() < 1e-9);
        assert!((overlap.share.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_segment_uses_midpoint() {
        let bounds = vec![(0.0, 50.0), (50.0, 50.2), (50.2, 100.0)];
        let overlap = segment_overlap(&bounds, 100.0, 20.0);
        assert!((overlap.observation[1] - 0.25).abs() < 1e-12);
    }
}
