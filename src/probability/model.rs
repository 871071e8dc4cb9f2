//! Rate-to-probability conversion strategies.

use serde::{Deserialize, Serialize};

use crate::error::{QuakeError, Result};

/// Brownian Passage Time renewal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BptParams {
    /// Coefficient of variation of recurrence intervals.
    pub aperiodicity: f64,
    /// Years elapsed since the last large event.
    pub years_since_last: f64,
}

impl Default for BptParams {
    fn default() -> Self {
        Self {
            aperiodicity: 0.5,
            years_since_last: 0.0,
        }
    }
}

/// How a source turns annual rates into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ProbabilityModel {
    /// Time-independent Poisson.
    #[default]
    Poisson,
    /// Poisson with a regional rate correction blended in by `weight` (0-1).
    Empirical { weight: f64 },
    /// BPT renewal model expressed as a source-wide rate gain.
    TimeDependent(BptParams),
}

impl ProbabilityModel {
    pub fn name(&self) -> &'static str {
        match self {
            ProbabilityModel::Poisson => "poisson",
            ProbabilityModel::Empirical { .. } => "empirical",
            ProbabilityModel::TimeDependent(_) => "time-dependent",
        }
    }

    /// Whether probabilities depend only on rate and duration.
    pub fn is_poissonian(&self) -> bool {
        !matches!(self, ProbabilityModel::TimeDependent(_))
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ProbabilityModel::Poisson => Ok(()),
            ProbabilityModel::Empirical { weight } => {
                if (0.0..=1.0).contains(weight) {
                    Ok(())
                } else {
                    Err(QuakeError::config(format!("empirical weight {weight} outside [0, 1]")))
                }
            }
            ProbabilityModel::TimeDependent(params) => {
                if !(params.aperiodicity > 0.0 && params.aperiodicity.is_finite()) {
                    return Err(QuakeError::config(format!(
                        "aperiodicity {} must be positive",
                        params.aperiodicity
                    )));
                }
                if !(params.years_since_last >= 0.0 && params.years_since_last.is_finite()) {
                    return Err(QuakeError::config(format!(
                        "years since last event {} must be non-negative",
                        params.years_since_last
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Probability of at least one event: `1 - exp(-rate · duration)`.
pub fn poisson_probability(rate: f64, duration: f64) -> f64 {
    -(-rate * duration).exp_m1()
}

/// Expected number of events behind a Poisson probability: `-ln(1 - p)`.
pub fn expected_count(probability: f64) -> f64 {
    -(-probability).ln_1p()
}

/// Blends a regional correction with unity: `correction · w + (1 - w)`.
pub fn effective_correction(correction: f64, weight: f64) -> f64 {
    correction * weight + (1.0 - weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisson_probability_monotonic() {
        let rate = 0.01;
        assert_eq!(poisson_probability(rate, 0.0), 0.0);
        let mut last = 0.0;
        for d in [1.0, 10.0, 30.0, 100.0, 1000.0] {
            let p = poisson_probability(rate, d);
            assert!(p > last && p < 1.0);
            last = p;
        }
        assert!(poisson_probability(rate, 1e5) > 0.999_999);
    }

    #[test]
    fn test_expected_count_inverts_probability() {
        let p = poisson_probability(0.2, 3.0);
        assert!((expected_count(p) - 0.6).abs() < 1e-12);
        assert!((expected_count(0.1) - 0.105_360_515_657_826_3).abs() < 1e-12);
    }

    #[test]
    fn test_effective_correction() {
        assert!((effective_correction(2.0, 0.5) - 1.5).abs() < 1e-12);
        assert_eq!(effective_correction(3.0, 0.0), 1.0);
        assert_eq!(effective_correction(3.0, 1.0), 3.0);
    }

    #[test]
    fn test_model_validation() {
        assert!(ProbabilityModel::Poisson.validate().is_ok());
        assert!(ProbabilityModel::Empirical { weight: 1.2 }.validate().is_err());
        let bad = ProbabilityModel::TimeDependent(BptParams {
            aperiodicity: 0.0,
            years_since_last: 10.0,
        });
        assert!(bad.validate().is_err());
        assert!(!bad.is_poissonian());
        assert!(ProbabilityModel::Empirical { weight: 0.5 }.is_poissonian());
    }
}
