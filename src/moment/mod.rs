//! Moment budget module.
//!
//! Turns fault sections (geometry plus slip rate) into segment and
//! fault-level moment rates, and provides the magnitude-area scaling
//! relations used to size ruptures.

mod section;
mod segment;
pub mod scaling;

pub use section::FaultSection;
pub use segment::{AseismicityPolicy, FaultSegmentData, SectionExclusion, SegmentRecord};
pub use scaling::{
    EllsworthB, HanksBakun2002, MagAreaRelation, ScalingRelation, SHEAR_MODULUS,
    average_slip, mag_from_moment, moment_from_mag, moment_rate,
};
