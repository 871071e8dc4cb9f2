//! Truncated-Gaussian and Gutenberg-Richter distribution shapes.

use super::{IncrementalMfd, MagGrid};
use crate::error::{QuakeError, Result};

/// Slack when testing a bin against a truncation edge.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Gaussian around `mean`, truncated two-sidedly at `trunc_level` sigmas.
///
/// Rates are unnormalized shape values; callers scale them to a moment
/// or cumulative rate.
///
/// # Errors
/// `Configuration` when `sigma` is not positive or no bin falls inside
/// the truncation window.
pub fn truncated_gaussian(grid: MagGrid, mean: f64, sigma: f64, trunc_level: f64) -> Result<IncrementalMfd> {
    if !(sigma > 0.0) {
        return Err(QuakeError::config(format!("gaussian sigma {sigma} must be positive")));
    }
    if !(trunc_level > 0.0) {
        return Err(QuakeError::config(format!("truncation level {trunc_level} must be positive")));
    }

    let half_width = trunc_level * sigma + EDGE_TOLERANCE;
    let mut mfd = IncrementalMfd::zeros(grid);
    for i in 0..grid.num {
        let dm = grid.mag(i) - mean;
        if dm.abs() <= half_width {
            mfd.set_rate(i, (-dm * dm / (2.0 * sigma * sigma)).exp());
        }
    }

    if mfd.total_rate() <= 0.0 {
        return Err(QuakeError::config(format!(
            "no magnitude bin within {trunc_level} sigma of {mean:.3}"
        )));
    }
    Ok(mfd)
}

/// Gutenberg-Richter shape `10^(-b·m)` over the bins `[mag_lower, mag_upper]`.
///
/// Both edges must be bin centers of `grid`.
pub fn gutenberg_richter(grid: MagGrid, mag_lower: f64, mag_upper: f64, b_value: f64) -> Result<IncrementalMfd> {
    let lower = grid.index_of(mag_lower).ok_or_else(|| {
        QuakeError::config(format!("GR lower edge {mag_lower:.3} is not a bin center"))
    })?;
    let upper = grid.index_of(mag_upper).ok_or_else(|| {
        QuakeError::config(format!("GR upper edge {mag_upper:.3} is not a bin center"))
    })?;
    if upper < lower {
        return Err(QuakeError::config(format!(
            "GR upper edge {mag_upper:.3} below lower edge {mag_lower:.3}"
        )));
    }

    let mut mfd = IncrementalMfd::zeros(grid);
    for i in lower..=upper {
        mfd.set_rate(i, 10f64.powf(-b_value * grid.mag(i)));
    }
    Ok(mfd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_truncation_is_two_sided() {
        let mfd = truncated_gaussian(MagGrid::default(), 7.3, 0.12, 2.0).unwrap();
        let nonzero: Vec<f64> = mfd.iter().filter(|&(_, r)| r > 0.0).map(|(m, _)| m).collect();
        // Bin centers sit at x.x5, so 7.3 ± 0.24 keeps 7.15 through 7.45.
        assert_eq!(nonzero.len(), 4);
        assert!((nonzero[0] - 7.15).abs() < 1e-9);
        assert!(nonzero.iter().all(|m| (m - 7.3).abs() <= 0.24 + 1e-9));

        // Symmetric about the mean.
        let lo = mfd.rate_at(7.15);
        let hi = mfd.rate_at(7.45);
        assert!((lo - hi).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_outside_grid_fails() {
        assert!(truncated_gaussian(MagGrid::default(), 3.0, 0.12, 2.0).is_err());
        assert!(truncated_gaussian(MagGrid::default(), 7.0, 0.0, 2.0).is_err());
    }

    #[test]
    fn test_gutenberg_richter_slope() {
        let mfd = gutenberg_richter(MagGrid::default(), 6.55, 7.25, 0.8).unwrap();
        let ratio = mfd.rate_at(6.65) / mfd.rate_at(6.55);
        assert!((ratio - 10f64.powf(-0.08)).abs() < 1e-12);
        assert_eq!(mfd.rate_at(7.35), 0.0);
        assert_eq!(mfd.rate_at(6.45), 0.0);
        assert!(gutenberg_richter(MagGrid::default(), 6.5, 7.25, 0.8).is_err());
        assert!(gutenberg_richter(MagGrid::default(), 7.25, 6.55, 0.8).is_err());
    }
}
