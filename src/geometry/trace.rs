//! Fault traces in a local Cartesian frame.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Joint points closer than this (km) are treated as the same location.
const JOINT_TOLERANCE_KM: f64 = 1e-6;

/// Ordered surface trace of a fault, in km east / km north.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultTrace {
    /// Human-readable name of the trace.
    pub name: String,
    points: Vec<DVec2>,
}

impl FaultTrace {
    /// Creates a trace from ordered points.
    pub fn new(name: impl Into<String>, points: Vec<DVec2>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Creates a straight two-point trace.
    pub fn straight(name: impl Into<String>, start: DVec2, end: DVec2) -> Self {
        Self::new(name, vec![start, end])
    }

    /// Trace points in order.
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total polyline length in km.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Unit vector from the first to the last point.
    ///
    /// Falls back to due north for degenerate traces.
    pub fn strike_direction(&self) -> DVec2 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*last - *first).try_normalize().unwrap_or(DVec2::Y),
            _ => DVec2::Y,
        }
    }

    /// Horizontal unit vector pointing down-dip (strike rotated 90 degrees clockwise).
    pub fn dip_direction(&self) -> DVec2 {
        let s = self.strike_direction();
        DVec2::new(s.y, -s.x)
    }

    /// Point at the given along-trace distance (km), clamped to the trace ends.
    ///
    /// # Arguments
    /// * `distance` - Distance from the first point along the polyline
    ///
    /// # Returns
    /// The interpolated location, or the origin for an empty trace.
    pub fn point_at_distance(&self, distance: f64) -> DVec2 {
        let Some(first) = self.points.first() else {
            return DVec2::ZERO;
        };
        if distance <= 0.0 {
            return *first;
        }

        let mut remaining = distance;
        for w in self.points.windows(2) {
            let seg_len = w[0].distance(w[1]);
            if remaining <= seg_len && seg_len > 0.0 {
                return w[0].lerp(w[1], remaining / seg_len);
            }
            remaining -= seg_len;
        }

        *self.points.last().unwrap_or(first)
    }

    /// Appends another trace, dropping its first point if it repeats our last one.
    pub fn append(&mut self, other: &FaultTrace) {
        let mut iter = other.points.iter().copied().peekable();
        if let (Some(last), Some(next)) = (self.points.last(), iter.peek()) {
            if last.distance(*next) < JOINT_TOLERANCE_KM {
                iter.next();
            }
        }
        self.points.extend(iter);
    }
}
