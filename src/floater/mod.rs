//! Rupture floating module.
//!
//! Slides magnitude-dependent rupture windows across a gridded fault
//! surface and splits each magnitude bin's rate evenly among them:
//! - Window layout for the full-width, strike-and-dip and centered-dip policies
//! - Expansion of a magnitude-frequency distribution into windowed ruptures
//! - Per-segment observation probabilities of a floating rupture

mod config;
mod windows;
mod float;
pub mod overlap;

pub use config::{FloaterConfig, FloaterType};
pub use windows::{WindowLayout, float_windows, rupture_dimensions};
pub use float::{FloatedRupture, float_mfd};
pub use overlap::{SegmentOverlap, observation_probability, segment_overlap};
