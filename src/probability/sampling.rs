//! Stochastic event counts for Poissonian ruptures.

use rand::Rng;

use super::expected_count;
use crate::error::{QuakeError, Result};

/// Number of occurrences of a rupture with the given probability.
///
/// Equivalent to [`poisson_event_count_for_lambda`] with mean
/// `-ln(1 - probability)`. Callers that still hold the rate should pass
/// the mean directly, since probabilities round to 1 for long durations.
///
/// # Errors
/// `Configuration` when the probability is outside `[0, 1)`.
pub fn poisson_event_count<R: Rng>(rng: &mut R, probability: f64) -> Result<usize> {
    if !(0.0..1.0).contains(&probability) {
        return Err(QuakeError::config(format!(
            "cannot sample a rupture with probability {probability}"
        )));
    }
    poisson_event_count_for_lambda(rng, expected_count(probability))
}

/// Number of occurrences of a rupture with expected count `lambda`.
///
/// Draws one uniform value and inverts the Poisson CDF, accumulating at
/// most `round(10·λ) + 2` terms. If the draw is never reached the count is
/// the last term index. Terms are carried in log space so large means do
/// not underflow the first term.
///
/// # Errors
/// `Configuration` when `lambda` is negative or not finite.
pub fn poisson_event_count_for_lambda<R: Rng>(rng: &mut R, lambda: f64) -> Result<usize> {
    if !(lambda >= 0.0 && lambda.is_finite()) {
        return Err(QuakeError::config(format!(
            "cannot sample a rupture with expected count {lambda}"
        )));
    }
    if lambda == 0.0 {
        return Ok(0);
    }

    let max_terms = (10.0 * lambda).round() as usize + 2;
    let ln_lambda = lambda.ln();
    let u: f64 = rng.random();

    let mut k = 0usize;
    let mut ln_pmf = -lambda;
    let mut cdf = ln_pmf.exp();
    while u > cdf && k + 1 < max_terms {
        k += 1;
        ln_pmf += ln_lambda - (k as f64).ln();
        cdf += ln_pmf.exp();
    }
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sampling_calibration() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = 100_000;
        let total: usize = (0..draws).map(|_| poisson_event_count(&mut rng, 0.1).unwrap()).sum();

        let lambda = -(0.9f64).ln();
        let mean = total as f64 / draws as f64;
        let standard_error = (lambda / draws as f64).sqrt();
        assert!((mean - lambda).abs() < 3.0 * standard_error, "mean {mean} vs {lambda}");
    }

    #[test]
    fn test_zero_probability_never_fires() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(poisson_event_count(&mut rng, 0.0).unwrap(), 0);
        }
    }

    #[test]
    fn test_count_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let lambda = -(1.0f64 - 0.5).ln();
        let bound = (10.0 * lambda).round() as usize + 2;
        for _ in 0..1000 {
            assert!(poisson_event_count(&mut rng, 0.5).unwrap() < bound);
        }
    }

    #[test]
    fn test_large_mean_calibration() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let draws = 2_000;
        let lambda = 1_000.0;
        let total: usize = (0..draws)
            .map(|_| poisson_event_count_for_lambda(&mut rng, lambda).unwrap())
            .sum();

        let mean = total as f64 / draws as f64;
        let standard_error = (lambda / draws as f64).sqrt();
        assert!((mean - lambda).abs() < 4.0 * standard_error, "mean {mean} vs {lambda}");
    }

    #[test]
    fn test_invalid_lambda() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(poisson_event_count_for_lambda(&mut rng, 0.0).unwrap(), 0);
        assert!(poisson_event_count_for_lambda(&mut rng, -1.0).is_err());
        assert!(poisson_event_count_for_lambda(&mut rng, f64::INFINITY).is_err());
        assert!(poisson_event_count_for_lambda(&mut rng, f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(poisson_event_count(&mut rng, 1.0).is_err());
        assert!(poisson_event_count(&mut rng, -0.1).is_err());
    }
}
