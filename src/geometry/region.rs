//! Polygonal map regions.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Closed polygon in the local map frame (km east, km north).
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    vertices: Vec<DVec2>,
}

impl Region {
    pub fn new(vertices: Vec<DVec2>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle spanning two corners.
    pub fn rectangle(min: DVec2, max: DVec2) -> Self {
        Self::new(vec![
            DVec2::new(min.x, min.y),
            DVec2::new(max.x, min.y),
            DVec2::new(max.x, max.y),
            DVec2::new(min.x, max.y),
        ])
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Even-odd ray casting test.
    pub fn contains(&self, p: DVec2) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Fraction of points whose map projection falls inside the region.
    ///
    /// Returns 0 for an empty point set.
    pub fn fraction_inside(&self, points: impl IntoIterator<Item = DVec3>) -> f64 {
        let mut total = 0usize;
        let mut inside = 0usize;
        for p in points {
            total += 1;
            if self.contains(p.truncate()) {
                inside += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            inside as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_contains() {
        let region = Region::rectangle(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0));
        assert!(region.contains(DVec2::new(5.0, 2.5)));
        assert!(!region.contains(DVec2::new(11.0, 2.5)));
        assert!(!region.contains(DVec2::new(5.0, -1.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape open to the north.
        let region = Region::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(6.0, 0.0),
            DVec2::new(6.0, 6.0),
            DVec2::new(4.0, 6.0),
            DVec2::new(4.0, 2.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(2.0, 6.0),
            DVec2::new(0.0, 6.0),
        ]);
        assert!(region.contains(DVec2::new(1.0, 5.0)));
        assert!(!region.contains(DVec2::new(3.0, 5.0)));
        assert!(region.contains(DVec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_fraction_inside() {
        let region = Region::rectangle(DVec2::new(0.0, 0.0), DVec2::new(10.0, 10.0));
        let points = (0..10).map(|i| DVec3::new(i as f64 * 2.0 + 0.5, 5.0, 3.0));
        assert!((region.fraction_inside(points) - 0.5).abs() < 1e-12);
        assert_eq!(region.fraction_inside(std::iter::empty()), 0.0);
    }
}
