//! Configuration for rupture floating.

use serde::{Deserialize, Serialize};

use crate::error::{QuakeError, Result};

/// How rupture windows are placed on the fault surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FloaterType {
    /// Slide along strike only, always spanning the full down-dip width.
    #[default]
    FullWidth,
    /// Slide along strike and down dip independently.
    StrikeAndDip,
    /// Slide along strike, centered down dip.
    CenteredDip,
}

impl FloaterType {
    pub fn name(&self) -> &'static str {
        match self {
            FloaterType::FullWidth => "full-width",
            FloaterType::StrikeAndDip => "strike-and-dip",
            FloaterType::CenteredDip => "centered-dip",
        }
    }
}

/// Parameters of the rupture floater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloaterConfig {
    pub floater_type: FloaterType,
    /// Distance (km) between neighbouring window positions.
    pub offset_km: f64,
    /// Float characteristic ruptures like the GR tail instead of
    /// placing them on the whole surface.
    pub float_characteristic: bool,
}

impl Default for FloaterConfig {
    fn default() -> Self {
        Self {
            floater_type: FloaterType::FullWidth,
            offset_km: 5.0,
            float_characteristic: false,
        }
    }
}

impl FloaterConfig {
    /// Windows slide along strike and down dip.
    pub fn strike_and_dip() -> Self {
        Self {
            floater_type: FloaterType::StrikeAndDip,
            ..Default::default()
        }
    }

    /// Windows slide along strike, centered down dip.
    pub fn centered_dip() -> Self {
        Self {
            floater_type: FloaterType::CenteredDip,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.offset_km > 0.0 && self.offset_km.is_finite()) {
            return Err(QuakeError::config(format!("rupture offset {} must be positive", self.offset_km)));
        }
        Ok(())
    }
}
