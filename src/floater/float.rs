//! Expands a magnitude-frequency distribution into windowed ruptures.

use crate::error::Result;
use crate::geometry::{GriddedSurface, SurfaceWindow};
use crate::mfd::IncrementalMfd;
use crate::moment::MagAreaRelation;

use super::{float_windows, FloaterConfig};

/// One (magnitude bin, window) pair with its share of the bin rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatedRupture {
    pub mag: f64,
    /// Annual rate of this window.
    pub rate: f64,
    pub window: SurfaceWindow,
}

/// Floats every non-empty bin of `mfd` over `surface`.
///
/// Each bin's rate is split evenly across its windows. When
/// `whole_surface` is set, every bin gets a single window covering the
/// full surface instead.
///
/// # Arguments
/// * `surface` - Surface to float on
/// * `mfd` - Rates by magnitude
/// * `relation` - Magnitude-area scaling used to size windows
/// * `config` - Floater policy and offset
/// * `whole_surface` - Skip floating and use the full surface
pub fn float_mfd(
    surface: &GriddedSurface,
    mfd: &IncrementalMfd,
    relation: &impl MagAreaRelation,
    config: &FloaterConfig,
    whole_surface: bool,
) -> Result<Vec<FloatedRupture>> {
    config.validate()?;
    let mut ruptures = Vec::new();

    for (mag, rate) in mfd.iter() {
        if rate <= 0.0 {
            continue;
        }
        let windows = if whole_surface {
            vec![surface.full_window()]
        } else {
            float_windows(surface, relation.median_area(mag), config.offset_km, config.floater_type)?
        };
        let rate_each = rate / windows.len() as f64;
        ruptures.extend(windows.into_iter().map(|window| FloatedRupture {
            mag,
            rate: rate_each,
            window,
        }));
    }

    Ok(ruptures)
}
