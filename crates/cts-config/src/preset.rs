//! Configuration presets for common alphabets.
//!
//! - Bytes: arbitrary binary data, 256 symbols, depth 8
//! - Text: printable ASCII plus newline, depth 6
//! - Binary: `0`/`1` character streams, depth 16, KT prior

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{AlphabetSpec, ModelConfig, PriorSpec, SwitchRateSpec};

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// All byte values, order-8 contexts
    Bytes,
    /// Printable ASCII and newline, order-6 contexts
    Text,
    /// Two-symbol streams, order-16 contexts
    Binary,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[PresetName::Bytes, PresetName::Text, PresetName::Binary];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Bytes => "bytes",
            PresetName::Text => "text",
            PresetName::Binary => "binary",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "bytes" | "byte" | "raw" => Some(PresetName::Bytes),
            "text" | "ascii" => Some(PresetName::Text),
            "binary" | "bits" => Some(PresetName::Binary),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Bytes => "Any file as a byte stream; 256 symbols, context length 8",
            PresetName::Text => "Plain ASCII text; 96 symbols, context length 6",
            PresetName::Binary => "Streams of '0'/'1' characters; context length 16, KT prior",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| format!("unknown preset: {}", s))
    }
}

/// Printable ASCII (space through tilde) followed by newline.
pub fn printable_ascii() -> String {
    (0x20u8..=0x7e)
        .map(char::from)
        .chain(std::iter::once('\n'))
        .collect()
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> ModelConfig {
    match name {
        PresetName::Bytes => ModelConfig {
            max_context_length: 8,
            comment: Some(name.description().to_string()),
            ..Default::default()
        },
        PresetName::Text => ModelConfig {
            max_context_length: 6,
            comment: Some(name.description().to_string()),
            alphabet: AlphabetSpec::Chars {
                symbols: printable_ascii(),
            },
            ..Default::default()
        },
        PresetName::Binary => ModelConfig {
            max_context_length: 16,
            symbol_prior: PriorSpec::Token("jeffreys".to_string()),
            switch_rate: SwitchRateSpec::default(),
            comment: Some(name.description().to_string()),
            alphabet: AlphabetSpec::Chars {
                symbols: "01".to_string(),
            },
            ..Default::default()
        },
    }
}

/// List presets with their descriptions.
pub fn list_presets() -> Vec<(PresetName, &'static str)> {
    PresetName::ALL
        .iter()
        .map(|p| (*p, p.description()))
        .collect()
}
