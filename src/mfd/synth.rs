//! Splits a moment-rate budget into a characteristic Gaussian and a
//! Gutenberg-Richter tail.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::shapes::{gutenberg_richter, truncated_gaussian};
use super::{IncrementalMfd, MagGrid};
use crate::error::{QuakeError, Result};
use crate::moment::MagAreaRelation;

/// Characteristic magnitude and cumulative rate imposed instead of a moment split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedCharacteristic {
    pub mag: f64,
    /// Annual cumulative rate of the characteristic event.
    pub rate: f64,
}

/// Parameters of the MFD synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfdConfig {
    /// Magnitude discretization.
    pub grid: MagGrid,
    /// Fraction of moment given to the characteristic event (0-1).
    pub char_fraction: f64,
    /// Gaussian sigma of the characteristic event.
    pub char_sigma: f64,
    /// Two-sided truncation of the characteristic Gaussian, in sigmas.
    pub char_trunc_level: f64,
    /// Gutenberg-Richter b-value of the tail.
    pub b_value: f64,
    /// Lower magnitude cutoff of the GR tail (bin edge).
    pub gr_lower_mag: f64,
    /// Fraction of the moment rate removed before synthesis (0-1).
    pub moment_rate_reduction: f64,
    /// Correction added to the scaling-relation magnitude.
    pub mean_mag_correction: f64,
    /// Optional fixed characteristic magnitude and rate.
    pub fixed_char: Option<FixedCharacteristic>,
    /// Relative moment error above which a warning is recorded.
    pub moment_tolerance: f64,
}

impl Default for MfdConfig {
    fn default() -> Self {
        Self {
            grid: MagGrid::default(),
            char_fraction: 0.67,
            char_sigma: 0.12,
            char_trunc_level: 2.0,
            b_value: 0.8,
            gr_lower_mag: 6.5,
            moment_rate_reduction: 0.0,
            mean_mag_correction: 0.0,
            fixed_char: None,
            moment_tolerance: 1e-3,
        }
    }
}

impl MfdConfig {
    /// All moment in the characteristic event, no GR tail.
    pub fn characteristic_only() -> Self {
        Self {
            char_fraction: 1.0,
            ..Default::default()
        }
    }

    /// Type-B fault settings: 10% of the moment rate removed.
    pub fn b_fault() -> Self {
        Self {
            moment_rate_reduction: 0.1,
            ..Default::default()
        }
    }

    /// Pins the characteristic event to a magnitude and annual rate.
    pub fn with_fixed_characteristic(mut self, mag: f64, rate: f64) -> Self {
        self.fixed_char = Some(FixedCharacteristic { mag, rate });
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if !(0.0..=1.0).contains(&self.char_fraction) {
            return Err(QuakeError::config(format!(
                "characteristic fraction {} outside [0, 1]",
                self.char_fraction
            )));
        }
        if !(self.char_sigma > 0.0) {
            return Err(QuakeError::config(format!("characteristic sigma {} must be positive", self.char_sigma)));
        }
        if !(self.char_trunc_level > 0.0) {
            return Err(QuakeError::config(format!(
                "truncation level {} must be positive",
                self.char_trunc_level
            )));
        }
        if !self.b_value.is_finite() || !self.gr_lower_mag.is_finite() || !self.mean_mag_correction.is_finite() {
            return Err(QuakeError::config("non-finite GR parameters"));
        }
        if !(0.0..1.0).contains(&self.moment_rate_reduction) {
            return Err(QuakeError::config(format!(
                "moment rate reduction {} outside [0, 1)",
                self.moment_rate_reduction
            )));
        }
        if !(self.moment_tolerance > 0.0) {
            return Err(QuakeError::config("moment tolerance must be positive"));
        }
        if let Some(fixed) = &self.fixed_char {
            if !(fixed.rate >= 0.0 && fixed.mag.is_finite()) {
                return Err(QuakeError::config(format!(
                    "invalid fixed characteristic: mag {}, rate {}",
                    fixed.mag, fixed.rate
                )));
            }
        }
        Ok(())
    }
}

/// Moment-rate mismatch beyond the configured tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericInconsistency {
    pub target: f64,
    pub realized: f64,
    pub relative_error: f64,
}

/// Bookkeeping of a synthesis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MfdDiagnostics {
    /// Moment rate the distribution was asked to carry (N·m/yr).
    pub target_moment_rate: f64,
    /// Σ rate·moment of the summed distribution (N·m/yr).
    pub realized_moment_rate: f64,
    pub relative_error: f64,
    pub warnings: Vec<NumericInconsistency>,
}

/// Output of [`synthesize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedMfd {
    /// Characteristic plus GR.
    pub total: IncrementalMfd,
    pub characteristic: IncrementalMfd,
    /// GR tail, absent when the characteristic magnitude is at or below the cutoff.
    pub gutenberg_richter: Option<IncrementalMfd>,
    /// Center of the characteristic Gaussian.
    pub char_mag: f64,
    pub diagnostics: MfdDiagnostics,
}

impl SynthesizedMfd {
    /// Distribution with no events, for faults without seismogenic area.
    pub fn empty(grid: MagGrid) -> Self {
        Self {
            total: IncrementalMfd::zeros(grid),
            characteristic: IncrementalMfd::zeros(grid),
            gutenberg_richter: None,
            char_mag: grid.min_mag,
            diagnostics: MfdDiagnostics::default(),
        }
    }
}

/// Characteristic magnitude of a rupture filling `area` km², rounded to `delta`.
pub fn characteristic_magnitude(relation: &impl MagAreaRelation, area: f64, correction: f64, delta: f64) -> f64 {
    let mag = relation.median_mag(area) + correction;
    (mag / delta).round() * delta
}

/// Builds the characteristic and GR distributions for a moment budget.
///
/// # Arguments
/// * `config` - Synthesis parameters
/// * `moment_rate` - Fault moment rate before reduction (N·m/yr)
/// * `char_mag` - Characteristic magnitude (ignored with a fixed characteristic)
///
/// # Returns
/// The summed distribution, its parts, and moment diagnostics. Moment
/// mismatches are reported in the diagnostics, never as errors.
pub fn synthesize(config: &MfdConfig, moment_rate: f64, char_mag: f64) -> Result<SynthesizedMfd> {
    config.validate()?;
    let grid = config.grid;
    let half_bin = grid.delta / 2.0;
    let reduced_moment = moment_rate * (1.0 - config.moment_rate_reduction);

    let char_mag = config.fixed_char.map(|f| f.mag).unwrap_or(char_mag);
    if char_mag < grid.min_mag - half_bin || char_mag > grid.max_mag() + half_bin {
        return Err(QuakeError::config(format!(
            "characteristic magnitude {char_mag:.3} outside grid [{:.3}, {:.3}]",
            grid.min_mag - half_bin,
            grid.max_mag() + half_bin
        )));
    }

    let has_tail = char_mag > config.gr_lower_mag + 1e-9;
    let char_moment = if has_tail {
        config.char_fraction * reduced_moment
    } else {
        reduced_moment
    };

    let mut characteristic = truncated_gaussian(grid, char_mag, config.char_sigma, config.char_trunc_level)?;
    match config.fixed_char {
        Some(fixed) => {
            characteristic.scale_to_total_rate(fixed.rate * (1.0 - config.moment_rate_reduction))?
        }
        None => characteristic.scale_to_moment_rate(char_moment)?,
    }

    let gutenberg_richter = if has_tail {
        let mut gr = gutenberg_richter(
            grid,
            config.gr_lower_mag + half_bin,
            char_mag - half_bin,
            config.b_value,
        )?;
        gr.scale_to_moment_rate((1.0 - config.char_fraction) * reduced_moment)?;
        Some(gr)
    } else {
        None
    };

    let mut total = characteristic.clone();
    if let Some(gr) = &gutenberg_richter {
        total.add(gr)?;
    }

    let target = match config.fixed_char {
        Some(_) => {
            characteristic.total_moment_rate()
                + gutenberg_richter.as_ref().map(|_| (1.0 - config.char_fraction) * reduced_moment).unwrap_or(0.0)
        }
        None => reduced_moment,
    };
    let diagnostics = moment_diagnostics(target, total.total_moment_rate(), config.moment_tolerance);

    debug!(
        char_mag,
        has_tail,
        target = diagnostics.target_moment_rate,
        realized = diagnostics.realized_moment_rate,
        "synthesized magnitude-frequency distribution"
    );

    Ok(SynthesizedMfd {
        total,
        characteristic,
        gutenberg_richter,
        char_mag,
        diagnostics,
    })
}

fn moment_diagnostics(target: f64, realized: f64, tolerance: f64) -> MfdDiagnostics {
    let relative_error = if target > 0.0 {
        (realized - target).abs() / target
    } else if realized > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let mut warnings = Vec::new();
    if relative_error > tolerance {
        warn!(target, realized, relative_error, "moment rate not conserved by MFD");
        warnings.push(NumericInconsistency {
            target,
            realized,
            relative_error,
        });
    }

    MfdDiagnostics {
        target_moment_rate: target,
        realized_moment_rate: realized,
        relative_error,
        warnings,
    }
}

/// Probability that a rupture of magnitude `mag` reaches the ground surface.
pub fn prob_visible(mag: f64) -> f64 {
    let e = (-12.51 + 2.053 * mag).exp();
    e / (1.0 + e)
}

/// Distribution of surface-rupturing events.
pub fn visible_mfd(mfd: &IncrementalMfd) -> IncrementalMfd {
    mfd.map_rates(|m, r| r * prob_visible(m))
}
