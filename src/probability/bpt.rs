//! Brownian Passage Time renewal probabilities.

use statrs::function::erf::erfc;

use super::BptParams;

/// Standard normal CDF.
fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// BPT cumulative distribution at time `t`.
///
/// # Arguments
/// * `t` - Time since the last event (years)
/// * `mean` - Mean recurrence interval (years)
/// * `alpha` - Aperiodicity
pub fn bpt_cdf(t: f64, mean: f64, alpha: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let a = (t / mean).sqrt();
    let b = (mean / t).sqrt();
    let u1 = (a - b) / alpha;
    let u2 = (a + b) / alpha;

    // exp(2/alpha²) overflows for small alpha; combine in log space, and
    // once Φ(-u2) underflows use the Mills-ratio tail φ(u2)/u2, for which
    // exp(2/alpha²)·φ(u2) = φ(u1).
    let tail = std_normal_cdf(-u2);
    let second = if tail > 1e-300 {
        (2.0 / (alpha * alpha) + tail.ln()).exp()
    } else {
        (-0.5 * u1 * u1).exp() / (u2 * (2.0 * std::f64::consts::PI).sqrt())
    };
    (std_normal_cdf(u1) + second).clamp(0.0, 1.0)
}

/// Probability of an event in `[t, t + duration)` given none before `t`.
pub fn bpt_conditional_probability(mean: f64, alpha: f64, years_since_last: f64, duration: f64) -> f64 {
    let f_now = bpt_cdf(years_since_last, mean, alpha);
    let survival = 1.0 - f_now;
    if survival < 1e-12 {
        // Far past the mean the hazard settles at 1 / (2 · mean · alpha²).
        let hazard = 1.0 / (2.0 * mean * alpha * alpha);
        return -(-hazard * duration).exp_m1();
    }
    let f_later = bpt_cdf(years_since_last + duration, mean, alpha);
    ((f_later - f_now) / survival).clamp(0.0, 1.0)
}

/// Rate multiplier that makes Poisson ruptures reproduce the BPT probability.
///
/// With `P` the conditional probability for a source of total rate `R`,
/// returns `g = -ln(1 - P) / (R · duration)`, so that folding
/// `1 - exp(-r_i · duration · g)` over all ruptures gives back `P`.
pub fn bpt_rate_gain(total_rate: f64, params: &BptParams, duration: f64) -> f64 {
    if total_rate <= 0.0 || duration <= 0.0 {
        return 1.0;
    }
    let mean = 1.0 / total_rate;
    let p = bpt_conditional_probability(mean, params.aperiodicity, params.years_since_last, duration);
    let p = p.min(1.0 - f64::EPSILON);
    -(-p).ln_1p() / (total_rate * duration)
}
