//! Evenly gridded planar fault surfaces and rectangular windows on them.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::FaultTrace;
use crate::error::{QuakeError, Result};

/// Rectangular sub-grid of a [`GriddedSurface`].
///
/// Counts are in grid points, so a window always covers at least one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceWindow {
    pub start_row: usize,
    pub start_col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl SurfaceWindow {
    pub fn new(start_row: usize, start_col: usize, rows: usize, cols: usize) -> Self {
        Self {
            start_row,
            start_col,
            rows,
            cols,
        }
    }

    /// Exclusive end column.
    pub fn end_col(&self) -> usize {
        self.start_col + self.cols
    }

    /// Exclusive end row.
    pub fn end_row(&self) -> usize {
        self.start_row + self.rows
    }

    /// Whether the given column lies inside the window.
    pub fn covers_col(&self, col: usize) -> bool {
        col >= self.start_col && col < self.end_col()
    }

    /// Number of grid points in the window.
    pub fn num_points(&self) -> usize {
        self.rows * self.cols
    }
}

/// Planar fault surface sampled on a regular grid.
///
/// Rows step down-dip, columns step along strike. Points are stored
/// row-major as (km east, km north, km depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedSurface {
    rows: usize,
    cols: usize,
    spacing_along: f64,
    spacing_down: f64,
    dip: f64,
    upper_depth: f64,
    lower_depth: f64,
    points: Vec<DVec3>,
}

impl GriddedSurface {
    /// Grids a dipping surface hanging below a trace.
    ///
    /// The realized spacings are adjusted so the grid spans the trace length
    /// and down-dip width exactly.
    ///
    /// # Arguments
    /// * `trace` - Surface trace, projected onto the top edge
    /// * `dip` - Dip in degrees, in (0, 90]
    /// * `upper_depth` - Upper seismogenic depth in km
    /// * `lower_depth` - Lower seismogenic depth in km
    /// * `spacing` - Target grid spacing in km
    pub fn from_trace(
        trace: &FaultTrace,
        dip: f64,
        upper_depth: f64,
        lower_depth: f64,
        spacing: f64,
    ) -> Result<Self> {
        if trace.is_empty() {
            return Err(QuakeError::config(format!("trace '{}' has no points", trace.name)));
        }
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(QuakeError::config(format!("dip {dip} outside (0, 90]")));
        }
        if !(upper_depth >= 0.0 && lower_depth >= upper_depth) {
            return Err(QuakeError::config(format!(
                "invalid seismogenic depths: upper {upper_depth}, lower {lower_depth}"
            )));
        }
        if !(spacing > 0.0 && spacing.is_finite()) {
            return Err(QuakeError::config(format!("grid spacing {spacing} must be positive")));
        }

        let dip_rad = dip.to_radians();
        let length = trace.length();
        let width = (lower_depth - upper_depth) / dip_rad.sin();

        let (cols, spacing_along) = grid_steps(length, spacing);
        let (rows, spacing_down) = grid_steps(width, spacing);

        let dip_dir = trace.dip_direction();
        let horizontal_step = spacing_down * dip_rad.cos();
        let vertical_step = spacing_down * dip_rad.sin();

        let mut points = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let offset = dip_dir * (r as f64 * horizontal_step);
            let depth = upper_depth + r as f64 * vertical_step;
            for c in 0..cols {
                let p = trace.point_at_distance(c as f64 * spacing_along) + offset;
                points.push(DVec3::new(p.x, p.y, depth));
            }
        }

        Ok(Self {
            rows,
            cols,
            spacing_along,
            spacing_down,
            dip,
            upper_depth,
            lower_depth,
            points,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Realized along-strike spacing in km.
    pub fn spacing_along(&self) -> f64 {
        self.spacing_along
    }

    /// Realized down-dip spacing in km.
    pub fn spacing_down(&self) -> f64 {
        self.spacing_down
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    pub fn upper_depth(&self) -> f64 {
        self.upper_depth
    }

    pub fn lower_depth(&self) -> f64 {
        self.lower_depth
    }

    /// Along-strike length in km.
    pub fn surface_length(&self) -> f64 {
        self.spacing_along * (self.cols - 1) as f64
    }

    /// Down-dip width in km.
    pub fn surface_width(&self) -> f64 {
        self.spacing_down * (self.rows - 1) as f64
    }

    /// Area in km².
    pub fn surface_area(&self) -> f64 {
        self.surface_length() * self.surface_width()
    }

    /// Grid point at (row, col), if inside the grid.
    pub fn location(&self, row: usize, col: usize) -> Option<DVec3> {
        if row < self.rows && col < self.cols {
            self.points.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// Window covering every grid point.
    pub fn full_window(&self) -> SurfaceWindow {
        SurfaceWindow::new(0, 0, self.rows, self.cols)
    }

    /// Whether a window is non-empty and lies inside the grid.
    pub fn contains_window(&self, window: &SurfaceWindow) -> bool {
        window.rows > 0
            && window.cols > 0
            && window.end_row() <= self.rows
            && window.end_col() <= self.cols
    }

    /// Iterates over the grid points of a window (clipped to the grid).
    pub fn window_points<'a>(&'a self, window: &SurfaceWindow) -> impl Iterator<Item = DVec3> + 'a {
        let rows = window.start_row..window.end_row().min(self.rows);
        let cols = window.start_col..window.end_col().min(self.cols);
        rows.flat_map(move |r| cols.clone().map(move |c| self.points[r * self.cols + c]))
    }

    /// Along-strike length of a window in km.
    pub fn window_length(&self, window: &SurfaceWindow) -> f64 {
        self.spacing_along * window.cols.saturating_sub(1) as f64
    }

    /// Down-dip width of a window in km.
    pub fn window_width(&self, window: &SurfaceWindow) -> f64 {
        self.spacing_down * window.rows.saturating_sub(1) as f64
    }

    /// Mean of the window's corner points.
    pub fn window_centroid(&self, window: &SurfaceWindow) -> DVec3 {
        let last_row = window.end_row().min(self.rows).saturating_sub(1);
        let last_col = window.end_col().min(self.cols).saturating_sub(1);
        let corners = [
            (window.start_row, window.start_col),
            (window.start_row, last_col),
            (last_row, window.start_col),
            (last_row, last_col),
        ];
        let sum: DVec3 = corners
            .iter()
            .filter_map(|&(r, c)| self.location(r, c))
            .sum();
        sum / 4.0
    }
}

/// Number of grid points and realized spacing covering `extent` km.
fn grid_steps(extent: f64, target_spacing: f64) -> (usize, f64) {
    if extent <= 0.0 {
        return (1, target_spacing);
    }
    let steps = (extent / target_spacing).round().max(1.0) as usize;
    (steps + 1, extent / steps as f64)
}
