//! Property-based tests for predictor invariants.

use cts_core::{Alphabet, PriorPolicy, SequentialPredictor, SwitchRate};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ALPHABET_SIZE: u8 = 5;

fn prior_strategy() -> impl Strategy<Value = PriorPolicy> {
    prop_oneof![
        Just(PriorPolicy::Perks),
        Just(PriorPolicy::Laplace),
        Just(PriorPolicy::Jeffreys),
        (0.01f64..10.0).prop_map(PriorPolicy::Fixed),
    ]
}

fn rate_strategy() -> impl Strategy<Value = SwitchRate> {
    prop_oneof![
        Just(SwitchRate::Decaying),
        (0.0f64..0.5).prop_map(SwitchRate::Fixed),
    ]
}

fn stream_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..ALPHABET_SIZE, 0..max_len)
}

fn predictor(depth: usize, prior: PriorPolicy, rate: SwitchRate) -> SequentialPredictor<u8> {
    SequentialPredictor::new(
        Alphabet::new(0..ALPHABET_SIZE).expect("alphabet"),
        depth,
        prior,
        rate,
    )
    .expect("predictor")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn distribution_sums_to_one(
        stream in stream_strategy(120),
        depth in 0usize..6,
        prior in prior_strategy(),
        rate in rate_strategy(),
    ) {
        let mut p = predictor(depth, prior, rate);
        let sum: f64 = p.predictive_distribution().iter().map(|(_, q)| q).sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "untrained sum={sum}");

        for s in &stream {
            p.update(s).unwrap();
            let dist = p.predictive_distribution();
            let sum: f64 = dist.iter().map(|(_, q)| q).sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum={sum}");
            prop_assert!(dist.iter().all(|(_, q)| *q > 0.0 && *q < 1.0));
        }
    }

    #[test]
    fn update_log_prob_is_non_positive_and_finite(
        stream in stream_strategy(200),
        depth in 0usize..8,
        rate in rate_strategy(),
    ) {
        let mut p = predictor(depth, PriorPolicy::Perks, rate);
        for s in &stream {
            let lp = p.update(s).unwrap();
            prop_assert!(lp.is_finite());
            prop_assert!(lp <= 0.0);
        }
    }

    #[test]
    fn update_returns_the_predicted_probability(
        stream in stream_strategy(80),
        depth in 0usize..5,
    ) {
        let mut p = predictor(depth, PriorPolicy::Jeffreys, SwitchRate::Decaying);
        for s in &stream {
            let dist = p.predictive_distribution();
            let expected = dist[*s as usize].1.ln();
            let lp = p.update(s).unwrap();
            prop_assert!((lp - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn depth_zero_is_the_closed_form_estimator(
        stream in stream_strategy(100),
        prior in prior_strategy(),
    ) {
        let mut p = predictor(0, prior, SwitchRate::Decaying);
        let alpha = prior.pseudo_count(ALPHABET_SIZE as usize);
        let mut counts = [0u64; ALPHABET_SIZE as usize];
        for (n, s) in stream.iter().enumerate() {
            let expected = (counts[*s as usize] as f64 + alpha)
                / (n as f64 + ALPHABET_SIZE as f64 * alpha);
            let lp = p.update(s).unwrap();
            prop_assert!((lp.exp() - expected).abs() < 1e-12);
            counts[*s as usize] += 1;
        }
    }

    #[test]
    fn node_growth_is_bounded_by_depth(
        stream in stream_strategy(150),
        depth in 0usize..6,
    ) {
        let mut p = predictor(depth, PriorPolicy::Perks, SwitchRate::Decaying);
        for s in &stream {
            let before = p.tree().node_count();
            p.update(s).unwrap();
            prop_assert!(p.tree().node_count() <= before + depth);
        }
        prop_assert!(p.stats().max_depth_reached <= depth);
        prop_assert_eq!(
            p.tree().nodes().root().estimator().total(),
            stream.len() as u64
        );
    }

    #[test]
    fn observe_excursion_is_neutral(
        prefix in stream_strategy(60),
        excursion in stream_strategy(20),
        suffix in stream_strategy(30),
        depth in 1usize..5,
    ) {
        let mut a = predictor(depth, PriorPolicy::Perks, SwitchRate::Decaying);
        let mut b = predictor(depth, PriorPolicy::Perks, SwitchRate::Decaying);
        for s in &prefix {
            a.update(s).unwrap();
            b.update(s).unwrap();
        }

        let saved = b.context();
        for s in &excursion {
            b.observe(s).unwrap();
        }
        b.set_context(&saved).unwrap();

        for s in &suffix {
            let la = a.update(s).unwrap();
            let lb = b.update(s).unwrap();
            prop_assert_eq!(la.to_bits(), lb.to_bits());
        }
    }

    #[test]
    fn rejection_sampling_stays_in_support(
        stream in prop::collection::vec(0u8..ALPHABET_SIZE, 1..80),
        depth in 0usize..4,
        seed in any::<u64>(),
    ) {
        let mut p = predictor(depth, PriorPolicy::Laplace, SwitchRate::Decaying);
        for s in &stream {
            p.update(s).unwrap();
        }

        // Walk the tree by the live context to find the deepest node.
        let ctx = p.context();
        let nodes = p.tree().nodes();
        let mut node = nodes.root();
        for s in ctx.symbols().iter().rev() {
            match node.child(*s as usize) {
                Some(id) => node = nodes.get(id),
                None => break,
            }
        }
        let support: Vec<u8> = node.estimator().seen_symbols().map(|i| i as u8).collect();
        prop_assume!(!support.is_empty());

        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..32 {
            let s = p.sample(true, &mut rng);
            prop_assert!(support.contains(&s), "sampled {s} outside {support:?}");
        }
    }

    #[test]
    fn identical_streams_give_identical_models(
        stream in stream_strategy(100),
        depth in 0usize..5,
        rate in rate_strategy(),
    ) {
        let mut a = predictor(depth, PriorPolicy::Perks, rate);
        let mut b = predictor(depth, PriorPolicy::Perks, rate);
        let ra = a.update_batch(&stream).unwrap();
        let rb = b.update_batch(&stream).unwrap();
        prop_assert_eq!(ra, rb);
        prop_assert_eq!(a, b);
    }
}
