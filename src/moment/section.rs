//! Fault sections as delivered by a geometry/slip-rate provider.

use serde::{Deserialize, Serialize};

use crate::error::{QuakeError, Result};
use crate::geometry::FaultTrace;

/// One contiguous piece of fault with uniform properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultSection {
    pub name: String,
    pub trace: FaultTrace,
    /// Dip in degrees, in (0, 90].
    pub dip: f64,
    /// Upper seismogenic depth in km.
    pub upper_depth: f64,
    /// Lower seismogenic depth in km.
    pub lower_depth: f64,
    /// Rake in degrees.
    pub rake: f64,
    /// Long-term slip rate in mm/yr.
    pub slip_rate: f64,
    /// Slip-rate standard deviation in mm/yr.
    pub slip_rate_std_dev: f64,
    /// Fraction of slip released aseismically, in [0, 1).
    pub aseismic_factor: f64,
}

impl FaultSection {
    /// Creates a vertical strike-slip section with no aseismic slip.
    pub fn vertical(name: impl Into<String>, trace: FaultTrace, lower_depth: f64, slip_rate: f64) -> Self {
        Self {
            name: name.into(),
            trace,
            dip: 90.0,
            upper_depth: 0.0,
            lower_depth,
            rake: 180.0,
            slip_rate,
            slip_rate_std_dev: 0.0,
            aseismic_factor: 0.0,
        }
    }

    /// Along-strike length in km.
    pub fn length(&self) -> f64 {
        self.trace.length()
    }

    /// Down-dip width in km.
    pub fn down_dip_width(&self) -> f64 {
        (self.lower_depth - self.upper_depth) / self.dip.to_radians().sin()
    }

    /// Full area in km², ignoring aseismicity.
    pub fn area(&self) -> f64 {
        self.length() * self.down_dip_width()
    }

    /// Upper depth after shrinking the seismogenic width by `(1 - aseismic_factor)`.
    pub fn reduced_upper_depth(&self) -> f64 {
        self.lower_depth - (self.lower_depth - self.upper_depth) * (1.0 - self.aseismic_factor)
    }

    /// Checks that the section's parameters are physically meaningful.
    pub fn validate(&self) -> Result<()> {
        if !(self.dip > 0.0 && self.dip <= 90.0) {
            return Err(QuakeError::config(format!(
                "section '{}': dip {} outside (0, 90]",
                self.name, self.dip
            )));
        }
        if !(self.upper_depth >= 0.0 && self.lower_depth >= self.upper_depth) {
            return Err(QuakeError::config(format!(
                "section '{}': invalid depths {}..{}",
                self.name, self.upper_depth, self.lower_depth
            )));
        }
        if !(self.slip_rate >= 0.0 && self.slip_rate_std_dev >= 0.0) {
            return Err(QuakeError::config(format!(
                "section '{}': negative slip rate or std-dev",
                self.name
            )));
        }
        if !(0.0..1.0).contains(&self.aseismic_factor) {
            return Err(QuakeError::config(format!(
                "section '{}': aseismic factor {} outside [0, 1)",
                self.name, self.aseismic_factor
            )));
        }
        if self.trace.is_empty() {
            return Err(QuakeError::config(format!("section '{}' has an empty trace", self.name)));
        }
        Ok(())
    }
}
