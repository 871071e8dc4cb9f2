//! Fault rupture floating, magnitude-frequency synthesis and probability engine.
//!
//! This crate turns fault sections (trace geometry, slip rate, aseismicity)
//! into a probability-weighted catalog of rupture scenarios: it splits each
//! fault's moment budget between a characteristic event and a
//! Gutenberg-Richter tail, floats magnitude-sized windows across the fault
//! surface, and converts annual rates into occurrence probabilities.

pub mod error;
pub mod geometry;
pub mod moment;
pub mod mfd;
pub mod floater;
pub mod probability;
pub mod source;

pub use error::{QuakeError, Result};
pub use geometry::{FaultTrace, GriddedSurface, Region, SurfaceWindow};
pub use moment::{AseismicityPolicy, FaultSection, FaultSegmentData, MagAreaRelation, ScalingRelation};
pub use mfd::{IncrementalMfd, MagGrid, MfdConfig, MfdDiagnostics};
pub use floater::{FloaterConfig, FloaterType};
pub use probability::{BptParams, EmpiricalCorrection, ProbabilityModel, RegionalCorrection};
pub use source::{FaultSource, Forecast, Rupture, RuptureKind, SourceConfig};
