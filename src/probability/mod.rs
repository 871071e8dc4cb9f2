//! Probability model module.
//!
//! Converts annual rupture rates into occurrence probabilities over a
//! forecast duration, either time-independently (Poisson), with a
//! regional empirical correction, or with a BPT renewal gain, and draws
//! stochastic event counts for Poissonian sources.

mod model;
mod empirical;
mod sampling;
pub mod bpt;

pub use model::{BptParams, ProbabilityModel, effective_correction, expected_count, poisson_probability};
pub use empirical::{EmpiricalCorrection, RegionalCorrection};
pub use sampling::{poisson_event_count, poisson_event_count_for_lambda};
pub use bpt::{bpt_cdf, bpt_conditional_probability, bpt_rate_gain};
