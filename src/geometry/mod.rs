//! Fault geometry module.
//!
//! Provides fault traces in a local kilometre frame, evenly gridded fault
//! surfaces with rectangular windows, and polygonal regions used to clip
//! rupture probabilities.

mod trace;
mod surface;
mod region;

pub use trace::FaultTrace;
pub use surface::{GriddedSurface, SurfaceWindow};
pub use region::Region;
