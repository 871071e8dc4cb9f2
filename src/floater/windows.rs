//! Placement of fixed-size rupture windows on a gridded surface.

use crate::error::{QuakeError, Result};
use crate::geometry::{GriddedSurface, SurfaceWindow};

use super::FloaterType;

/// Rupture length and width (km) for a rupture of `area` km².
///
/// Ruptures are square until the width reaches the surface's down-dip
/// extent, then grow only in length. The sizing is the same for every
/// policy; `FullWidth` widens the window rows afterwards without changing
/// the length. A surface with no down-dip extent yields an unbounded
/// length, which floats as a single window.
pub fn rupture_dimensions(area: f64, surface: &GriddedSurface) -> (f64, f64) {
    let width = area.max(0.0).sqrt().min(surface.surface_width());
    let length = if width > 0.0 { area / width } else { f64::INFINITY };
    (length, width)
}

/// Window size and stepping in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub floater: FloaterType,
    /// Window columns, clamped to the surface.
    pub cols: usize,
    /// Window rows, clamped to the surface.
    pub rows: usize,
    pub offset_cols: usize,
    pub offset_rows: usize,
    /// Window positions along strike.
    pub n_along: usize,
    /// Window positions down dip.
    pub n_down: usize,
}

impl WindowLayout {
    /// Computes the layout for a rupture of the given size.
    ///
    /// # Arguments
    /// * `surface` - Surface to float on
    /// * `length` - Rupture length in km
    /// * `width` - Rupture width in km
    /// * `offset_km` - Step between window positions in km
    /// * `floater` - Placement policy
    ///
    /// # Errors
    /// `Configuration` when the offset rounds to zero grid steps.
    pub fn new(
        surface: &GriddedSurface,
        length: f64,
        width: f64,
        offset_km: f64,
        floater: FloaterType,
    ) -> Result<Self> {
        let surface_cols = surface.num_cols();
        let surface_rows = surface.num_rows();

        let len_cols = (length / surface.spacing_along() + 1.0).round() as usize;
        let width_rows = (width / surface.spacing_down() + 1.0).round() as usize;
        let offset_cols = (offset_km / surface.spacing_along()).round() as usize;
        let offset_rows = (offset_km / surface.spacing_down()).round() as usize;

        if offset_cols == 0 {
            return Err(QuakeError::config(format!(
                "offset {offset_km} km rounds to zero columns at spacing {:.3} km",
                surface.spacing_along()
            )));
        }

        let cols = len_cols.clamp(1, surface_cols);
        let n_along = if len_cols >= surface_cols {
            1
        } else {
            (surface_cols - len_cols) / offset_cols + 1
        };

        let (rows, n_down) = match floater {
            FloaterType::FullWidth => (surface_rows, 1),
            FloaterType::CenteredDip => (width_rows.clamp(1, surface_rows), 1),
            FloaterType::StrikeAndDip => {
                let rows = width_rows.clamp(1, surface_rows);
                if width_rows >= surface_rows {
                    (rows, 1)
                } else if offset_rows == 0 {
                    return Err(QuakeError::config(format!(
                        "offset {offset_km} km rounds to zero rows at spacing {:.3} km",
                        surface.spacing_down()
                    )));
                } else {
                    (rows, (surface_rows - width_rows) / offset_rows + 1)
                }
            }
        };

        Ok(Self {
            floater,
            cols,
            rows,
            offset_cols,
            offset_rows,
            n_along,
            n_down,
        })
    }

    /// Total number of windows.
    pub fn count(&self) -> usize {
        self.n_along * self.n_down
    }

    /// Enumerates every window, along strike first.
    pub fn windows(&self, surface: &GriddedSurface) -> Vec<SurfaceWindow> {
        let centered_row = (surface.num_rows() - self.rows) / 2;
        let mut windows = Vec::with_capacity(self.count());
        for n in 0..self.count() {
            let along = n % self.n_along;
            let down = n / self.n_along;
            let start_row = match self.floater {
                FloaterType::FullWidth => 0,
                FloaterType::StrikeAndDip => down * self.offset_rows,
                FloaterType::CenteredDip => centered_row,
            };
            windows.push(SurfaceWindow::new(start_row, along * self.offset_cols, self.rows, self.cols));
        }
        windows
    }
}

/// Windows for a rupture of `area` km² floated over `surface`.
pub fn float_windows(
    surface: &GriddedSurface,
    area: f64,
    offset_km: f64,
    floater: FloaterType,
) -> Result<Vec<SurfaceWindow>> {
    let (length, width) = rupture_dimensions(area, surface);
    let layout = WindowLayout::new(surface, length, width, offset_km, floater)?;
    Ok(layout.windows(surface))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FaultTrace;
    use glam::DVec2;

    fn create_test_surface(length: f64, lower_depth: f64) -> GriddedSurface {
        let trace = FaultTrace::straight("test", DVec2::ZERO, DVec2::new(0.0, length));
        GriddedSurface::from_trace(&trace, 90.0, 0.0, lower_depth, 1.0).unwrap()
    }

    #[test]
    fn test_full_width_window_count() {
        let surface = create_test_surface(100.0, 15.0);
        for (length, expected) in [(30.0, 15), (20.0, 17), (95.0, 2), (100.0, 1)] {
            let windows = float_windows(&surface, length * 15.0, 5.0, FloaterType::FullWidth).unwrap();
            let formula = ((100.0 - length) / 5.0f64).floor() as usize + 1;
            assert_eq!(windows.len(), expected);
            assert_eq!(windows.len(), formula);
            assert!(windows.iter().all(|w| surface.contains_window(w)));
            assert!(windows.iter().all(|w| w.rows == 16 && w.start_row == 0));
        }
    }

    #[test]
    fn test_full_width_keeps_square_length_on_wide_surface() {
        // 371.5 km² on a 30 km deep surface: the rupture is ~19.27 km square,
        // so it floats a ~19.27 km length over all rows.
        let surface = create_test_surface(100.0, 30.0);
        let (length, width) = rupture_dimensions(371.5, &surface);
        assert!((length - 371.5f64.sqrt()).abs() < 1e-9);
        assert!((width - length).abs() < 1e-9);

        let windows = float_windows(&surface, 371.5, 5.0, FloaterType::FullWidth).unwrap();
        assert_eq!(windows.len(), 17);
        assert!(windows.iter().all(|w| w.cols == 20 && w.rows == surface.num_rows()));

        let square = float_windows(&surface, 371.5, 5.0, FloaterType::CenteredDip).unwrap();
        assert_eq!(square.len(), windows.len());
        assert!(square.iter().zip(&windows).all(|(a, b)| a.cols == b.cols && a.start_col == b.start_col));
    }

    #[test]
    fn test_longer_than_fault_spans_whole_surface() {
        let surface = create_test_surface(40.0, 15.0);
        let windows = float_windows(&surface, 5000.0, 5.0, FloaterType::FullWidth).unwrap();
        assert_eq!(windows, vec![surface.full_window()]);
    }

    #[test]
    fn test_strike_and_dip_cross_product() {
        let surface = create_test_surface(50.0, 20.0);
        // 10 km x 10 km square rupture.
        let layout = {
            let (l, w) = rupture_dimensions(100.0, &surface);
            assert!((l - 10.0).abs() < 1e-9 && (w - 10.0).abs() < 1e-9);
            WindowLayout::new(&surface, l, w, 5.0, FloaterType::StrikeAndDip).unwrap()
        };
        assert_eq!(layout.n_along, 9);
        assert_eq!(layout.n_down, 3);

        let windows = layout.windows(&surface);
        assert_eq!(windows.len(), 27);
        assert!(windows.iter().all(|w| surface.contains_window(w)));
        assert_eq!(windows[26].start_row, 10);
        assert_eq!(windows[26].start_col, 40);
    }

    #[test]
    fn test_centered_dip_is_vertically_centered() {
        let surface = create_test_surface(50.0, 20.0);
        let windows = float_windows(&surface, 100.0, 5.0, FloaterType::CenteredDip).unwrap();
        assert_eq!(windows.len(), 9);
        for w in &windows {
            assert_eq!(w.rows, 11);
            // 21 rows, 11 used: 5 above and 5 below.
            assert_eq!(w.start_row, 5);
            assert_eq!(surface.num_rows() - w.end_row(), w.start_row);
        }

        // Uneven leftover puts the window one row nearer the top.
        let surface = create_test_surface(50.0, 21.0);
        let windows = float_windows(&surface, 100.0, 5.0, FloaterType::CenteredDip).unwrap();
        let w = windows[0];
        assert_eq!(w.start_row, 5);
        assert_eq!(surface.num_rows() - w.end_row(), 6);
    }

    #[test]
    fn test_width_clamped_to_surface() {
        let surface = create_test_surface(100.0, 10.0);
        let (length, width) = rupture_dimensions(900.0, &surface);
        assert!((width - 10.0).abs() < 1e-9);
        assert!((length - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_offset_rejected() {
        let surface = create_test_surface(100.0, 15.0);
        let err = float_windows(&surface, 450.0, 0.3, FloaterType::FullWidth).unwrap_err();
        assert!(matches!(err, QuakeError::Configuration(_)));
    }
}
