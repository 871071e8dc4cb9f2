//! Rupture scenarios produced by a fault source.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::SurfaceWindow;
use crate::probability::poisson_probability;

/// Which part of the magnitude-frequency distribution a rupture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuptureKind {
    Characteristic,
    GutenbergRichter,
}

/// One earthquake scenario on a fault surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rupture {
    pub magnitude: f64,
    /// Rake in degrees.
    pub rake: f64,
    /// Annual rate from floating, before any correction.
    pub rate: f64,
    /// Multiplier applied to `rate` by the probability model.
    pub rate_gain: f64,
    /// Probability of occurrence over the current duration.
    pub probability: f64,
    /// Grid window of the rupture surface.
    pub window: SurfaceWindow,
    /// Centroid of the rupture surface.
    pub hypocenter: DVec3,
    pub kind: RuptureKind,
}

impl Rupture {
    /// Rate after the probability model's gain.
    pub fn effective_rate(&self) -> f64 {
        self.rate * self.rate_gain
    }

    /// Recomputes the probability for a new duration from the retained rate.
    pub fn update_probability(&mut self, duration: f64) {
        self.probability = poisson_probability(self.effective_rate(), duration);
    }
}
