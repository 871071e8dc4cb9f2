//! Regional empirical rate corrections.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Region;

/// Provider of a non-negative rate multiplier by map location.
pub trait EmpiricalCorrection {
    /// Rate multiplier at a location (km east, km north).
    fn correction_at(&self, location: DVec2) -> f64;

    /// Mean multiplier over a set of surface points (1 for an empty set).
    fn mean_correction(&self, points: &mut dyn Iterator<Item = DVec3>) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for p in points {
            sum += self.correction_at(p.truncate());
            count += 1;
        }
        if count == 0 {
            1.0
        } else {
            sum / count as f64
        }
    }
}

/// Table of polygons with a multiplier each; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalCorrection {
    pub regions: Vec<(Region, f64)>,
    /// Multiplier outside every polygon.
    pub default_correction: f64,
}

impl Default for RegionalCorrection {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            default_correction: 1.0,
        }
    }
}

impl RegionalCorrection {
    pub fn new(regions: Vec<(Region, f64)>) -> Self {
        Self {
            regions,
            ..Default::default()
        }
    }
}

impl EmpiricalCorrection for RegionalCorrection {
    fn correction_at(&self, location: DVec2) -> f64 {
        self.regions
            .iter()
            .find(|(region, _)| region.contains(location))
            .map(|&(_, c)| c)
            .unwrap_or(self.default_correction)
            .max(0.0)
    }
}
