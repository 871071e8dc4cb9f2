//! Magnitude-frequency distribution module.
//!
//! Discretized incremental distributions, the truncated-Gaussian and
//! Gutenberg-Richter shapes, and the synthesis that splits a fault's
//! moment budget between a characteristic event and a GR tail.

mod incremental;
mod shapes;
mod synth;

pub use incremental::{IncrementalMfd, MagGrid};
pub use shapes::{gutenberg_richter, truncated_gaussian};
pub use synth::{
    FixedCharacteristic, MfdConfig, MfdDiagnostics, NumericInconsistency, SynthesizedMfd,
    characteristic_magnitude, prob_visible, synthesize, visible_mfd,
};
