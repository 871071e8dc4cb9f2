//! Segment and fault-level moment budgets.
//!
//! A fault is an ordered list of segments, each an ordered list of sections.
//! Aseismic slip removes moment either by shrinking the seismogenic area or
//! by lowering the slip rate, selected once per fault by [`AseismicityPolicy`].

use serde::{Deserialize, Serialize};

use super::scaling::{moment_rate, SHEAR_MODULUS};
use super::FaultSection;
use crate::error::{QuakeError, Result};
use crate::geometry::{FaultTrace, GriddedSurface};

/// How the aseismic factor removes moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AseismicityPolicy {
    /// Shrink the area by `(1 - aseis)`, keep the full slip rate.
    #[default]
    ReducesArea,
    /// Keep the full area, scale the slip rate by `(1 - aseis)`.
    ReducesSlipRate,
}

/// Sections dropped from the stitched surface when two segments are joined.
///
/// Used for stepovers where adjacent segments overlap along strike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionExclusion {
    /// Segment pair (in stitching order) that triggers the exclusion.
    pub segments: (usize, usize),
    /// `(segment, section)` indices to skip.
    pub skipped: Vec<(usize, usize)>,
}

/// Derived moment budget of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub name: String,
    pub sections: Vec<FaultSection>,
    /// Seismogenic area in km², reduced under [`AseismicityPolicy::ReducesArea`].
    pub area: f64,
    /// Area in km² ignoring aseismicity.
    pub orig_area: f64,
    /// Along-strike length in km.
    pub length: f64,
    /// Effective slip rate in mm/yr.
    pub slip_rate: f64,
    /// Slip-rate standard deviation in mm/yr.
    pub slip_rate_std_dev: f64,
    /// Moment rate in N·m/yr.
    pub moment_rate: f64,
    /// Moment rate in N·m/yr as if no slip were aseismic.
    pub moment_rate_ignoring_aseismicity: f64,
}

impl SegmentRecord {
    /// Combines sections into one segment under the given policy.
    pub fn new(name: impl Into<String>, sections: Vec<FaultSection>, policy: AseismicityPolicy) -> Result<Self> {
        let name = name.into();
        if sections.is_empty() {
            return Err(QuakeError::config(format!("segment '{name}' has no sections")));
        }

        let mut area = 0.0;
        let mut orig_area = 0.0;
        let mut length = 0.0;
        let mut moment = 0.0;
        let mut moment_ignoring = 0.0;
        let mut rel_std_dev_area = 0.0;

        for section in &sections {
            section.validate()?;
            let sect_area = section.area();
            let alpha = 1.0 - section.aseismic_factor;
            let rel_std_dev = if section.slip_rate > 0.0 {
                section.slip_rate_std_dev / section.slip_rate
            } else {
                0.0
            };

            length += section.length();
            orig_area += sect_area;
            moment_ignoring += moment_rate(sect_area, section.slip_rate);

            let effective_area = match policy {
                AseismicityPolicy::ReducesArea => {
                    moment += moment_rate(sect_area * alpha, section.slip_rate);
                    sect_area * alpha
                }
                AseismicityPolicy::ReducesSlipRate => {
                    moment += moment_rate(sect_area, section.slip_rate * alpha);
                    sect_area
                }
            };
            area += effective_area;
            rel_std_dev_area += rel_std_dev * effective_area;
        }

        let slip_rate = if area > 0.0 {
            moment / (SHEAR_MODULUS * area * 1e6) * 1e3
        } else {
            0.0
        };
        let slip_rate_std_dev = if area > 0.0 {
            rel_std_dev_area / area * slip_rate
        } else {
            0.0
        };

        Ok(Self {
            name,
            sections,
            area,
            orig_area,
            length,
            slip_rate,
            slip_rate_std_dev,
            moment_rate: moment,
            moment_rate_ignoring_aseismicity: moment_ignoring,
        })
    }
}

/// Ordered segments of one fault plus fault-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultSegmentData {
    pub name: String,
    pub policy: AseismicityPolicy,
    segments: Vec<SegmentRecord>,
    exclusions: Vec<SectionExclusion>,
}

impl FaultSegmentData {
    /// Builds the moment budget of a fault.
    ///
    /// # Arguments
    /// * `name` - Fault name
    /// * `segments` - One `(name, sections)` entry per segment, in along-strike order
    /// * `policy` - How aseismic slip removes moment
    pub fn new(
        name: impl Into<String>,
        segments: Vec<(String, Vec<FaultSection>)>,
        policy: AseismicityPolicy,
    ) -> Result<Self> {
        let name = name.into();
        if segments.is_empty() {
            return Err(QuakeError::config(format!("fault '{name}' has no segments")));
        }
        let segments = segments
            .into_iter()
            .map(|(seg_name, sections)| SegmentRecord::new(seg_name, sections, policy))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            policy,
            segments,
            exclusions: Vec::new(),
        })
    }

    /// Attaches a section exclusion table, validating its indices.
    pub fn with_exclusions(mut self, exclusions: Vec<SectionExclusion>) -> Result<Self> {
        for exclusion in &exclusions {
            let (a, b) = exclusion.segments;
            self.segment(a)?;
            self.segment(b)?;
            for &(seg, sect) in &exclusion.skipped {
                let len = self.segment(seg)?.sections.len();
                if sect >= len {
                    return Err(QuakeError::IndexOutOfRange { kind: "section", index: sect, len });
                }
            }
        }
        self.exclusions = exclusions;
        Ok(self)
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[SegmentRecord] {
        &self.segments
    }

    pub fn exclusions(&self) -> &[SectionExclusion] {
        &self.exclusions
    }

    pub fn segment(&self, index: usize) -> Result<&SegmentRecord> {
        self.segments.get(index).ok_or(QuakeError::IndexOutOfRange {
            kind: "segment",
            index,
            len: self.segments.len(),
        })
    }

    /// Total seismogenic area in km².
    pub fn total_area(&self) -> f64 {
        self.segments.iter().map(|s| s.area).sum()
    }

    /// Total area in km² ignoring aseismicity.
    pub fn total_orig_area(&self) -> f64 {
        self.segments.iter().map(|s| s.orig_area).sum()
    }

    /// Total length in km.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Total moment rate in N·m/yr.
    pub fn total_moment_rate(&self) -> f64 {
        self.segments.iter().map(|s| s.moment_rate).sum()
    }

    pub fn total_moment_rate_ignoring_aseismicity(&self) -> f64 {
        self.segments.iter().map(|s| s.moment_rate_ignoring_aseismicity).sum()
    }

    /// Fault-wide slip rate in mm/yr implied by the total moment rate.
    pub fn total_ave_slip_rate(&self) -> f64 {
        let area = self.total_area();
        if area > 0.0 {
            self.total_moment_rate() / (SHEAR_MODULUS * area * 1e6) * 1e3
        } else {
            0.0
        }
    }

    /// Mean down-dip width in km (total area over total length).
    pub fn average_down_dip_width(&self) -> f64 {
        let length = self.total_length();
        if length > 0.0 {
            self.total_area() / length
        } else {
            0.0
        }
    }

    /// Area-weighted rake over every section, in degrees.
    pub fn average_rake(&self) -> f64 {
        let sections = self.segments.iter().flat_map(|s| s.sections.iter());
        let (weighted, weight, sum, count) = sections.fold((0.0, 0.0, 0.0, 0usize), |acc, sect| {
            let area = sect.area();
            (acc.0 + sect.rake * area, acc.1 + area, acc.2 + sect.rake, acc.3 + 1)
        });

        let rake = if weight > 0.0 {
            weighted / weight
        } else if count > 0 {
            sum / count as f64
        } else {
            0.0
        };
        if rake > 180.0 && rake - 180.0 < 1e-6 {
            180.0
        } else {
            rake
        }
    }

    /// Fraction of moment lost to aseismic slip.
    pub fn average_aseismicity(&self) -> f64 {
        let ignoring = self.total_moment_rate_ignoring_aseismicity();
        if ignoring > 0.0 {
            (1.0 - self.total_moment_rate() / ignoring).max(0.0)
        } else {
            0.0
        }
    }

    /// Along-strike distance (km) of each segment's start and end.
    pub fn segment_bounds(&self) -> Vec<(f64, f64)> {
        let mut start = 0.0;
        self.segments
            .iter()
            .map(|s| {
                let bounds = (start, start + s.length);
                start += s.length;
                bounds
            })
            .collect()
    }

    /// Grids the surface stitched from every segment.
    pub fn combined_surface(&self, spacing: f64) -> Result<GriddedSurface> {
        let all: Vec<usize> = (0..self.segments.len()).collect();
        self.combined_surface_for(&all, spacing)
    }

    /// Grids the surface stitched from the given segments, in order.
    ///
    /// Section traces are concatenated, and dip and depths are averaged
    /// weighted by section length. Sections named by an exclusion whose
    /// segment pair appears adjacently in `segment_indices` are skipped.
    pub fn combined_surface_for(&self, segment_indices: &[usize], spacing: f64) -> Result<GriddedSurface> {
        let mut skipped: Vec<(usize, usize)> = Vec::new();
        for pair in segment_indices.windows(2) {
            for exclusion in &self.exclusions {
                if exclusion.segments == (pair[0], pair[1]) {
                    skipped.extend_from_slice(&exclusion.skipped);
                }
            }
        }

        let mut trace = FaultTrace::new(self.name.clone(), Vec::new());
        let mut weight = 0.0;
        let mut dip = 0.0;
        let mut upper = 0.0;
        let mut lower = 0.0;
        let mut used = 0usize;

        for &seg_index in segment_indices {
            let segment = self.segment(seg_index)?;
            for (sect_index, section) in segment.sections.iter().enumerate() {
                if skipped.contains(&(seg_index, sect_index)) {
                    continue;
                }
                let w = section.length();
                let upper_depth = match self.policy {
                    AseismicityPolicy::ReducesArea => section.reduced_upper_depth(),
                    AseismicityPolicy::ReducesSlipRate => section.upper_depth,
                };
                trace.append(&section.trace);
                weight += w;
                dip += section.dip * w;
                upper += upper_depth * w;
                lower += section.lower_depth * w;
                used += 1;
            }
        }

        if used == 0 {
            return Err(QuakeError::config(format!(
                "fault '{}': no sections left to build a surface",
                self.name
            )));
        }
        if weight <= 0.0 {
            // Zero-length sections: fall back to an unweighted average of the first one.
            let first = segment_indices
                .first()
                .and_then(|&i| self.segments.get(i))
                .and_then(|s| s.sections.first())
                .ok_or_else(|| QuakeError::config("empty segment list"))?;
            return GriddedSurface::from_trace(&trace, first.dip, first.upper_depth, first.lower_depth, spacing);
        }

        GriddedSurface::from_trace(&trace, dip / weight, upper / weight, lower / weight, spacing)
    }
}
