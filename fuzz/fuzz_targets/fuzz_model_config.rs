//! Fuzz target for model configuration parsing.
//!
//! Arbitrary JSON and TOML must either fail to parse or fail validation,
//! never panic.

#![no_main]

use cts_config::{validate_model_config, ModelConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(config) = ModelConfig::from_json_str(data) {
        let _ = validate_model_config(&config);
    }
    if let Ok(config) = ModelConfig::from_toml_str(data) {
        let _ = validate_model_config(&config);
    }
});
