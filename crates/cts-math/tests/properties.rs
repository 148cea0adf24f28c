//! Property-based tests for cts-math primitives.
//!
//! Uses proptest to verify estimator and switching-weight invariants across
//! many random inputs.

use proptest::prelude::*;
use cts_math::{
    log_add_exp, EstimatorParams, LocalEstimator, PriorPolicy, SwitchRate, SwitchingWeight,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

fn prior_strategy() -> impl Strategy<Value = PriorPolicy> {
    prop_oneof![
        Just(PriorPolicy::Perks),
        Just(PriorPolicy::Laplace),
        Just(PriorPolicy::Jeffreys),
        (0.001..10.0f64).prop_map(PriorPolicy::Fixed),
    ]
}

// ============================================================================
// log_add_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// log_add_exp is commutative.
    #[test]
    fn log_add_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_add_exp(a, b);
        let ba = log_add_exp(b, a);
        prop_assert!((ab - ba).abs() <= TOL, "lae({},{})={} != lae({},{})={}", a, b, ab, b, a, ba);
    }

    /// log_add_exp never falls below its larger argument.
    #[test]
    fn log_add_exp_bounded_below_by_max(a in -700.0..700.0f64, b in -700.0..700.0f64) {
        let out = log_add_exp(a, b);
        prop_assert!(out.is_finite());
        prop_assert!(out >= a.max(b) - TOL);
        prop_assert!(out <= a.max(b) + std::f64::consts::LN_2 + TOL);
    }
}

// ============================================================================
// LocalEstimator properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The predictive distribution always sums to 1 and is strictly positive.
    #[test]
    fn estimator_distribution_normalised(
        alphabet_size in 1usize..64,
        prior in prior_strategy(),
        raw in prop::collection::vec(0usize..1000, 0..200),
    ) {
        let params = EstimatorParams::new(prior, alphabet_size);
        let mut est = LocalEstimator::new();
        for s in raw {
            est.observe(s % alphabet_size);
        }
        let dist = est.distribution(&params);
        let sum: f64 = dist.iter().sum();
        prop_assert!((sum - 1.0).abs() <= 1e-9, "sum = {}", sum);
        for p in dist {
            prop_assert!(p > 0.0 && p <= 1.0);
        }
    }

    /// Observing a symbol never lowers its own predictive probability.
    #[test]
    fn estimator_observe_is_monotone(
        alphabet_size in 2usize..32,
        prior in prior_strategy(),
        history in prop::collection::vec(0usize..32, 0..50),
        symbol in 0usize..32,
    ) {
        let params = EstimatorParams::new(prior, alphabet_size);
        let symbol = symbol % alphabet_size;
        let mut est = LocalEstimator::new();
        for s in history {
            est.observe(s % alphabet_size);
        }
        let before = est.predict(symbol, &params);
        est.observe(symbol);
        prop_assert!(est.predict(symbol, &params) >= before - TOL);
    }
}

// ============================================================================
// SwitchingWeight properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Weights stay a valid probability pair under any sequence of updates.
    #[test]
    fn switching_weight_stays_normalised(
        steps in prop::collection::vec((0.0001..1.0f64, 0.0001..1.0f64), 1..200),
        alpha in prop_oneof![Just(0.0), 0.0..0.5f64],
    ) {
        let mut w = SwitchingWeight::new();
        for (own, child) in steps {
            w.update(own, child, alpha);
            let total = w.stay() + w.split();
            prop_assert!((total - 1.0).abs() <= 1e-9, "stay+split = {}", total);
            prop_assert!(w.stay() >= 0.0 && w.stay() <= 1.0);
        }
    }

    /// A mixture lies between its two components.
    #[test]
    fn mix_is_convex(
        own in 0.0001..1.0f64,
        child in 0.0001..1.0f64,
        updates in prop::collection::vec((0.0001..1.0f64, 0.0001..1.0f64), 0..20),
        step in 1u64..10_000,
    ) {
        let mut w = SwitchingWeight::new();
        let rate = SwitchRate::Decaying;
        for (i, (o, c)) in updates.into_iter().enumerate() {
            w.update(o, c, rate.alpha(step + i as u64));
        }
        let mixed = w.mix(own, child);
        prop_assert!(mixed >= own.min(child) - TOL);
        prop_assert!(mixed <= own.max(child) + TOL);
    }

    /// Evidence in favour of the own estimator raises the stay weight.
    #[test]
    fn update_moves_toward_better_predictor(
        own in 0.5..1.0f64,
        child in 0.0001..0.4f64,
        alpha in 0.0..0.3f64,
    ) {
        let mut w = SwitchingWeight::new();
        w.update(own, child, alpha);
        prop_assert!(w.stay() > 0.5);
    }
}
