//! Fuzz target for predictor updates.
//!
//! Drives a small predictor with arbitrary parameters and symbol streams and
//! checks that every reported probability stays a valid probability.

#![no_main]

use arbitrary::Arbitrary;
use cts_core::{Alphabet, PriorPolicy, SequentialPredictor, SwitchRate};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Arbitrary)]
struct Input {
    alphabet_size: u8,
    depth: u8,
    fixed_rate: Option<u8>,
    symbols: Vec<u8>,
    excursion: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let size = input.alphabet_size.clamp(1, 16);
    let Ok(alphabet) = Alphabet::new(0..size) else {
        return;
    };
    let rate = match input.fixed_rate {
        Some(r) => SwitchRate::Fixed(f64::from(r) / 256.0),
        None => SwitchRate::Decaying,
    };
    let depth = usize::from(input.depth % 12);
    let Ok(mut p) = SequentialPredictor::new(alphabet, depth, PriorPolicy::Perks, rate) else {
        return;
    };

    for s in &input.symbols {
        match p.update(s) {
            Ok(lp) => assert!(lp.is_finite() && lp <= 0.0, "log prob {lp}"),
            Err(_) => assert!(*s >= size),
        }
    }

    let saved = p.context();
    let mut rng = StdRng::seed_from_u64(input.symbols.len() as u64);
    for s in &input.excursion {
        let _ = p.observe(s);
        let drawn = p.sample(true, &mut rng);
        assert!(drawn < size);
    }
    p.set_context(&saved).expect("restoring a saved context");

    let total: f64 = p.predictive_distribution().iter().map(|(_, q)| q).sum();
    assert!((total - 1.0).abs() < 1e-9, "distribution sums to {total}");
});
