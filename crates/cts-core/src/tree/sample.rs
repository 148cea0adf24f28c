//! Cumulative-distribution sampling over symbol indices.

use cts_math::LocalEstimator;

/// Pick the index whose cumulative interval contains `u` (`u` in `[0, 1)`).
///
/// Indices with zero weight are never returned. If rounding leaves `u`
/// beyond the final cumulative sum, the last positive index is used.
pub(crate) fn draw_index(weights: &[f64], u: f64) -> usize {
    let total: f64 = weights.iter().sum();
    let target = u * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = i;
        if target < cumulative {
            return i;
        }
    }
    last_positive
}

/// Zero every symbol the estimator never counted and renormalise.
///
/// Returns false and leaves `dist` untouched when no symbol has a count.
pub(crate) fn restrict_to_seen(dist: &mut [f64], estimator: &LocalEstimator) -> bool {
    if estimator.is_empty() {
        return false;
    }
    for (i, p) in dist.iter_mut().enumerate() {
        if estimator.count(i) == 0 {
            *p = 0.0;
        }
    }
    cts_math::normalize_in_place(dist) > 0.0
}
