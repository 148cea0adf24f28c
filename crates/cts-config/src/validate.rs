//! Configuration validation errors and semantic validation.

use std::collections::HashSet;

use cts_math::{PriorPolicy, SwitchRate};
use thiserror::Error;

use crate::model::{AlphabetSpec, ModelConfig, PriorSpec, SwitchRateSpec};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::UnknownPreset(_) => 67,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }

    /// Field the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// A configuration that passed every semantic check.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModelConfig {
    pub alphabet: AlphabetSpec,
    pub max_context_length: usize,
    pub prior: PriorPolicy,
    pub switch_rate: SwitchRate,
}

/// Validate a model configuration semantically.
pub fn validate_model_config(config: &ModelConfig) -> ValidationResult<ResolvedModelConfig> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_alphabet(&config.alphabet)?;
    let max_context_length = validate_context_length(config.max_context_length)?;
    let prior = validate_prior(&config.symbol_prior)?;
    let switch_rate = validate_switch_rate(&config.switch_rate)?;

    Ok(ResolvedModelConfig {
        alphabet: config.alphabet.clone(),
        max_context_length,
        prior,
        switch_rate,
    })
}

/// Alphabet must be non-empty with no repeated symbols.
fn validate_alphabet(alphabet: &AlphabetSpec) -> ValidationResult<()> {
    match alphabet {
        AlphabetSpec::Bytes => Ok(()),
        AlphabetSpec::Chars { symbols } => {
            if symbols.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "alphabet.symbols".to_string(),
                    message: "Must contain at least one symbol".to_string(),
                });
            }
            let mut seen = HashSet::new();
            for c in symbols.chars() {
                if !seen.insert(c) {
                    return Err(ValidationError::InvalidValue {
                        field: "alphabet.symbols".to_string(),
                        message: format!("Duplicate symbol {:?}", c),
                    });
                }
            }
            Ok(())
        }
    }
}

fn validate_context_length(length: i64) -> ValidationResult<usize> {
    if length < 0 {
        return Err(ValidationError::InvalidValue {
            field: "max_context_length".to_string(),
            message: format!("Must be non-negative, got {}", length),
        });
    }
    if length > crate::MAX_CONTEXT_LENGTH {
        return Err(ValidationError::InvalidValue {
            field: "max_context_length".to_string(),
            message: format!(
                "Must be at most {}, got {}",
                crate::MAX_CONTEXT_LENGTH,
                length
            ),
        });
    }
    Ok(length as usize)
}

fn validate_prior(spec: &PriorSpec) -> ValidationResult<PriorPolicy> {
    let parsed = match spec {
        PriorSpec::Token(token) => token.parse::<PriorPolicy>(),
        PriorSpec::PseudoCount(value) => PriorPolicy::fixed(*value).ok_or_else(|| {
            format!("pseudo-count must be positive and finite, got {}", value)
        }),
    };
    parsed.map_err(|message| ValidationError::InvalidValue {
        field: "symbol_prior".to_string(),
        message,
    })
}

fn validate_switch_rate(spec: &SwitchRateSpec) -> ValidationResult<SwitchRate> {
    let parsed = match spec {
        SwitchRateSpec::Token(token) => token.parse::<SwitchRate>(),
        SwitchRateSpec::Rate(alpha) => {
            let rate = SwitchRate::Fixed(*alpha);
            if rate.is_valid() {
                Ok(rate)
            } else {
                Err(format!("switch rate must be in [0, 1), got {}", alpha))
            }
        }
    };
    parsed.map_err(|message| ValidationError::InvalidValue {
        field: "switch_rate".to_string(),
        message,
    })
}
