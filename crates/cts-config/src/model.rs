//! Model configuration file types.
//!
//! A configuration file describes one context tree switching model:
//!
//! ```toml
//! schema_version = "1.0.0"
//! max_context_length = 6
//! symbol_prior = "perks"      # or a positive pseudo-count, e.g. 0.05
//! switch_rate = "decaying"    # or a constant in [0, 1), e.g. 0.02
//!
//! [alphabet]
//! kind = "chars"
//! symbols = "abcdefghijklmnopqrstuvwxyz "
//! ```
//!
//! The same structure is accepted as JSON. Values are only checked for shape
//! here; see [`crate::validate`] for semantic checks.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_max_context_length() -> i64 {
    8
}

/// Symbol set of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlphabetSpec {
    /// All 256 byte values, in numeric order.
    Bytes,
    /// The characters of `symbols`, in the order given.
    Chars { symbols: String },
}

impl Default for AlphabetSpec {
    fn default() -> Self {
        AlphabetSpec::Bytes
    }
}

impl AlphabetSpec {
    /// Number of symbols declared (duplicates included).
    pub fn len(&self) -> usize {
        match self {
            AlphabetSpec::Bytes => 256,
            AlphabetSpec::Chars { symbols } => symbols.chars().count(),
        }
    }

    /// Whether no symbols are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short human description.
    pub fn describe(&self) -> String {
        match self {
            AlphabetSpec::Bytes => "bytes (256 symbols)".to_string(),
            AlphabetSpec::Chars { symbols } => {
                format!("chars ({} symbols)", symbols.chars().count())
            }
        }
    }
}

/// Symbol prior as written in a file: a token or a pseudo-count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorSpec {
    Token(String),
    PseudoCount(f64),
}

impl Default for PriorSpec {
    fn default() -> Self {
        PriorSpec::Token("perks".to_string())
    }
}

/// Switch rate as written in a file: `"decaying"` or a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwitchRateSpec {
    Token(String),
    Rate(f64),
}

impl Default for SwitchRateSpec {
    fn default() -> Self {
        SwitchRateSpec::Token("decaying".to_string())
    }
}

/// Unvalidated model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Maximum context length D. Signed so that negative values in a file
    /// are reported as a validation error rather than a parse error.
    #[serde(default = "default_max_context_length")]
    pub max_context_length: i64,

    #[serde(default)]
    pub symbol_prior: PriorSpec,

    #[serde(default)]
    pub switch_rate: SwitchRateSpec,

    /// Free-form note, ignored by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Kept last so TOML output places the `[alphabet]` table after scalars.
    #[serde(default)]
    pub alphabet: AlphabetSpec,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            max_context_length: default_max_context_length(),
            symbol_prior: PriorSpec::default(),
            switch_rate: SwitchRateSpec::default(),
            comment: None,
            alphabet: AlphabetSpec::default(),
        }
    }
}

impl ModelConfig {
    /// Load a configuration file. `.toml` files are parsed as TOML, anything
    /// else as JSON.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(text: &str) -> ValidationResult<Self> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Render as pretty JSON.
    pub fn to_json_pretty(&self) -> ValidationResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("JSON encode failed: {}", e)))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ValidationResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("TOML encode failed: {}", e)))
    }
}
