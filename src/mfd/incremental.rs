//! Discretized incremental magnitude-frequency distributions.

use serde::{Deserialize, Serialize};

use crate::error::{QuakeError, Result};
use crate::moment::moment_from_mag;

/// Tolerance (in bin widths) for matching a magnitude to a bin center.
const BIN_MATCH_TOLERANCE: f64 = 1e-4;

/// Evenly spaced magnitude bin centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagGrid {
    /// Center of the first bin.
    pub min_mag: f64,
    /// Number of bins.
    pub num: usize,
    /// Bin width.
    pub delta: f64,
}

impl Default for MagGrid {
    fn default() -> Self {
        Self {
            min_mag: 5.05,
            num: 40,
            delta: 0.1,
        }
    }
}

impl MagGrid {
    pub fn new(min_mag: f64, num: usize, delta: f64) -> Self {
        Self { min_mag, num, delta }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num == 0 {
            return Err(QuakeError::config("magnitude grid needs at least one bin"));
        }
        if !(self.delta > 0.0 && self.delta.is_finite() && self.min_mag.is_finite()) {
            return Err(QuakeError::config(format!(
                "invalid magnitude grid: min {}, delta {}",
                self.min_mag, self.delta
            )));
        }
        Ok(())
    }

    /// Magnitude at bin `index`.
    pub fn mag(&self, index: usize) -> f64 {
        self.min_mag + index as f64 * self.delta
    }

    /// Center of the last bin.
    pub fn max_mag(&self) -> f64 {
        self.mag(self.num.saturating_sub(1))
    }

    /// Index of the bin centered on `mag`, if any.
    pub fn index_of(&self, mag: f64) -> Option<usize> {
        let x = (mag - self.min_mag) / self.delta;
        let i = x.round();
        if (x - i).abs() < BIN_MATCH_TOLERANCE && i >= 0.0 && (i as usize) < self.num {
            Some(i as usize)
        } else {
            None
        }
    }

    /// Index of the bin whose range `[center - delta/2, center + delta/2)` holds `mag`.
    pub fn nearest_index(&self, mag: f64) -> Option<usize> {
        let i = ((mag - self.min_mag) / self.delta).round();
        if i >= 0.0 && (i as usize) < self.num {
            Some(i as usize)
        } else {
            None
        }
    }
}

/// Annual rate per magnitude bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalMfd {
    grid: MagGrid,
    rates: Vec<f64>,
}

impl IncrementalMfd {
    /// Creates an all-zero distribution on `grid`.
    pub fn zeros(grid: MagGrid) -> Self {
        Self {
            grid,
            rates: vec![0.0; grid.num],
        }
    }

    pub fn grid(&self) -> &MagGrid {
        &self.grid
    }

    pub fn num_bins(&self) -> usize {
        self.rates.len()
    }

    pub fn mag(&self, index: usize) -> f64 {
        self.grid.mag(index)
    }

    pub fn rate(&self, index: usize) -> f64 {
        self.rates.get(index).copied().unwrap_or(0.0)
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Sets the rate of bin `index`; out-of-range indices are ignored.
    pub fn set_rate(&mut self, index: usize, rate: f64) {
        if let Some(r) = self.rates.get_mut(index) {
            *r = rate;
        }
    }

    /// `(magnitude, rate)` pairs in ascending magnitude.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rates.iter().enumerate().map(|(i, &r)| (self.grid.mag(i), r))
    }

    /// Rate of the bin centered on `mag` (0 when no bin matches).
    pub fn rate_at(&self, mag: f64) -> f64 {
        self.grid.index_of(mag).map(|i| self.rates[i]).unwrap_or(0.0)
    }

    /// Sum of incremental rates.
    pub fn total_rate(&self) -> f64 {
        self.rates.iter().sum()
    }

    /// Rate of events in bin `index` or above.
    pub fn cum_rate(&self, index: usize) -> f64 {
        self.rates.iter().skip(index).sum()
    }

    /// Σ rate_i · moment(mag_i) in N·m/yr.
    pub fn total_moment_rate(&self) -> f64 {
        self.iter().map(|(m, r)| r * moment_from_mag(m)).sum()
    }

    /// Highest magnitude with a non-zero rate.
    pub fn max_mag_with_rate(&self) -> Option<f64> {
        self.iter().filter(|&(_, r)| r > 0.0).map(|(m, _)| m).last()
    }

    /// Multiplies every rate by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for r in &mut self.rates {
            *r *= factor;
        }
    }

    /// Scales rates so the total moment rate equals `target`.
    pub fn scale_to_moment_rate(&mut self, target: f64) -> Result<()> {
        let realized = self.total_moment_rate();
        if realized <= 0.0 {
            return Err(QuakeError::config("cannot scale an empty distribution to a moment rate"));
        }
        self.scale(target / realized);
        Ok(())
    }

    /// Scales rates so the total (cumulative from the first bin) rate equals `target`.
    pub fn scale_to_total_rate(&mut self, target: f64) -> Result<()> {
        let realized = self.total_rate();
        if realized <= 0.0 {
            return Err(QuakeError::config("cannot scale an empty distribution to a rate"));
        }
        self.scale(target / realized);
        Ok(())
    }

    /// Bin-for-bin sum with another distribution on the same grid.
    pub fn add(&mut self, other: &IncrementalMfd) -> Result<()> {
        if self.grid != other.grid {
            return Err(QuakeError::config("cannot add distributions on different grids"));
        }
        for (a, b) in self.rates.iter_mut().zip(&other.rates) {
            *a += b;
        }
        Ok(())
    }

    /// Applies a per-bin multiplier that depends on magnitude.
    pub fn map_rates(&self, f: impl Fn(f64, f64) -> f64) -> IncrementalMfd {
        let rates = self.iter().map(|(m, r)| f(m, r)).collect();
        IncrementalMfd { grid: self.grid, rates }
    }
}
