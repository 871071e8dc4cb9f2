//! Configuration for fault sources.

use serde::{Deserialize, Serialize};

use crate::error::{QuakeError, Result};
use crate::floater::FloaterConfig;
use crate::mfd::MfdConfig;
use crate::moment::{AseismicityPolicy, ScalingRelation};
use crate::probability::{BptParams, ProbabilityModel};

/// Everything needed to rebuild a fault source from its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Magnitude-frequency synthesis.
    pub mfd: MfdConfig,
    /// Rupture floating.
    pub floater: FloaterConfig,
    /// Rate-to-probability conversion.
    pub probability: ProbabilityModel,
    /// Magnitude-area relation for the characteristic magnitude and window sizes.
    pub scaling: ScalingRelation,
    /// How aseismic slip removes moment.
    pub aseismicity: AseismicityPolicy,
    /// Target fault-surface grid spacing in km.
    pub grid_spacing_km: f64,
    /// Forecast duration in years.
    pub duration: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mfd: MfdConfig::default(),
            floater: FloaterConfig::default(),
            probability: ProbabilityModel::Poisson,
            scaling: ScalingRelation::HanksBakun2002,
            aseismicity: AseismicityPolicy::ReducesArea,
            grid_spacing_km: 1.0,
            duration: 1.0,
        }
    }
}

impl SourceConfig {
    /// Type-B fault: 10% moment-rate reduction, characteristic ruptures floated.
    pub fn b_fault() -> Self {
        Self {
            mfd: MfdConfig::b_fault(),
            floater: FloaterConfig {
                float_characteristic: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Square ruptures sliding along strike and down dip.
    pub fn down_dip_floating() -> Self {
        Self {
            floater: FloaterConfig::strike_and_dip(),
            ..Default::default()
        }
    }

    /// Renewal probabilities with the given BPT parameters.
    pub fn time_dependent(params: BptParams) -> Self {
        Self {
            probability: ProbabilityModel::TimeDependent(params),
            ..Default::default()
        }
    }

    /// Regionally corrected Poisson probabilities.
    pub fn empirical(weight: f64) -> Self {
        Self {
            probability: ProbabilityModel::Empirical { weight },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.mfd.validate()?;
        self.floater.validate()?;
        self.probability.validate()?;
        if !(self.grid_spacing_km > 0.0 && self.grid_spacing_km.is_finite()) {
            return Err(QuakeError::config(format!(
                "grid spacing {} must be positive",
                self.grid_spacing_km
            )));
        }
        validate_duration(self.duration)
    }
}

pub(crate) fn validate_duration(duration: f64) -> Result<()> {
    if duration >= 0.0 && duration.is_finite() {
        Ok(())
    } else {
        Err(QuakeError::config(format!("duration {duration} must be non-negative")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floater::FloaterType;

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert_eq!(config.probability, ProbabilityModel::Poisson);
        assert!((config.grid_spacing_km - 1.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_b_fault_config() {
        let config = SourceConfig::b_fault();
        assert!((config.mfd.moment_rate_reduction - 0.1).abs() < 1e-12);
        assert!(config.floater.float_characteristic);
    }

    #[test]
    fn test_down_dip_config() {
        let config = SourceConfig::down_dip_floating();
        assert_eq!(config.floater.floater_type, FloaterType::StrikeAndDip);
    }

    #[test]
    fn test_invalid_duration() {
        let config = SourceConfig {
            duration: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SourceConfig::empirical(2.0).validate().is_err());
    }
}
