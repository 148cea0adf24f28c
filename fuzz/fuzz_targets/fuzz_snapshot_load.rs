//! Fuzz target for saved-model loading.
//!
//! A tampered snapshot must be rejected by validation before any tree walk
//! can index out of bounds.

#![no_main]

use cts_core::{SavedModel, SequentialPredictor};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    let Ok(saved) = serde_json::from_slice::<SavedModel>(data) else {
        return;
    };
    let mut rng = StdRng::seed_from_u64(0);
    match saved {
        SavedModel::Bytes(snapshot) => {
            if let Ok(mut p) = SequentialPredictor::from_snapshot(snapshot) {
                let _ = p.sample(true, &mut rng);
                let _ = p.update(&0u8);
            }
        }
        SavedModel::Chars(snapshot) => {
            if let Ok(mut p) = SequentialPredictor::from_snapshot(snapshot) {
                let s = p.sample(true, &mut rng);
                let _ = p.update(&s);
            }
        }
    }
});
