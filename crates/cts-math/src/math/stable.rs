//! Numerically stable primitives for log-domain sequence prediction.

use std::f64::consts::LN_2;

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Convert a quantity in nats to bits.
pub fn nats_to_bits(nats: f64) -> f64 {
    nats / LN_2
}

/// Convert a quantity in bits to nats.
pub fn bits_to_nats(bits: f64) -> f64 {
    bits * LN_2
}

/// Rescale non-negative weights in place so they sum to 1.
///
/// Returns the original sum. Weights are left untouched when the sum is zero
/// or not finite, so callers can detect an empty support.
pub fn normalize_in_place(weights: &mut [f64]) -> f64 {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
    sum
}
