//! Model configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for model configuration files (JSON or TOML)
//! - Built-in presets for common alphabets
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation into a ready-to-build `ResolvedModelConfig`

pub mod model;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use model::{AlphabetSpec, ModelConfig, PriorSpec, SwitchRateSpec};
pub use preset::{get_preset, list_presets, PresetName};
pub use resolve::{load_model_config, resolve_config, ConfigPaths, ConfigSource};
pub use validate::{validate_model_config, ResolvedModelConfig, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Upper bound on the configured context length.
pub const MAX_CONTEXT_LENGTH: i64 = 256;
