//! Fault source module.
//!
//! A [`FaultSource`] owns the moment budget, magnitude-frequency
//! distributions and floated ruptures of one fault and rebuilds them in a
//! single pass on request. A [`Forecast`] groups sources under one duration
//! and exposes the iteration contract used by hazard calculators.

mod config;
mod rupture;
mod fault_source;
mod forecast;

pub use config::SourceConfig;
pub use rupture::{Rupture, RuptureKind};
pub use fault_source::FaultSource;
pub use forecast::Forecast;
