//! Predictors built from a configuration file.
//!
//! A configuration picks the symbol type at runtime: byte alphabets train on
//! raw file bytes, character alphabets on UTF-8 text. [`ConfiguredPredictor`]
//! hides that choice behind one type for the CLI and for saved models.

use std::path::Path;

use cts_config::{validate_model_config, AlphabetSpec, ModelConfig, ResolvedModelConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::predictor::{PredictorStats, SequentialPredictor};
use crate::snapshot::{read_json, write_json, ModelSnapshot};

/// Symbol type selected by a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Bytes,
    Chars,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Bytes => write!(f, "bytes"),
            SymbolKind::Chars => write!(f, "chars"),
        }
    }
}

/// A predictor over either bytes or characters.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredPredictor {
    Bytes(SequentialPredictor<u8>),
    Chars(SequentialPredictor<char>),
}

/// On-disk form of a [`ConfiguredPredictor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum SavedModel {
    Bytes(ModelSnapshot<u8>),
    Chars(ModelSnapshot<char>),
}

/// Loss summary for one pass over some input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub symbols: u64,
    /// Symbols dropped because they were outside the alphabet.
    pub skipped: u64,
    pub total_bits: f64,
    pub bits_per_symbol: f64,
    /// Bits per symbol of an order-0 estimator with the same prior.
    pub baseline_bits_per_symbol: f64,
    pub regret_bits: f64,
    /// `8 / bits_per_symbol` for byte alphabets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    pub node_count: usize,
    pub max_depth_reached: usize,
}

impl ConfiguredPredictor {
    /// Build an untrained predictor from a validated configuration.
    pub fn from_resolved(config: &ResolvedModelConfig) -> Result<Self> {
        let depth = config.max_context_length;
        match &config.alphabet {
            AlphabetSpec::Bytes => Ok(ConfiguredPredictor::Bytes(SequentialPredictor::new(
                Alphabet::bytes(),
                depth,
                config.prior,
                config.switch_rate,
            )?)),
            AlphabetSpec::Chars { symbols } => {
                Ok(ConfiguredPredictor::Chars(SequentialPredictor::new(
                    Alphabet::from_chars(symbols)?,
                    depth,
                    config.prior,
                    config.switch_rate,
                )?))
            }
        }
    }

    /// Validate `config` and build an untrained predictor from it.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::from_resolved(&validate_model_config(config)?)
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            ConfiguredPredictor::Bytes(_) => SymbolKind::Bytes,
            ConfiguredPredictor::Chars(_) => SymbolKind::Chars,
        }
    }

    pub fn alphabet_size(&self) -> usize {
        match self {
            ConfiguredPredictor::Bytes(p) => p.alphabet().len(),
            ConfiguredPredictor::Chars(p) => p.alphabet().len(),
        }
    }

    pub fn max_context_length(&self) -> usize {
        match self {
            ConfiguredPredictor::Bytes(p) => p.max_context_length(),
            ConfiguredPredictor::Chars(p) => p.max_context_length(),
        }
    }

    pub fn stats(&self) -> PredictorStats {
        match self {
            ConfiguredPredictor::Bytes(p) => p.stats(),
            ConfiguredPredictor::Chars(p) => p.stats(),
        }
    }

    /// Train on raw input. Character models decode it as UTF-8 first.
    ///
    /// With `skip_unknown`, symbols outside the alphabet are dropped and
    /// counted; otherwise the first one aborts with `InvalidSymbol`, leaving
    /// the updates before it applied.
    pub fn train(&mut self, input: &[u8], skip_unknown: bool) -> Result<EvaluationReport> {
        let before = self.stats();
        let skipped = match self {
            ConfiguredPredictor::Bytes(p) => train_stream(p, input.iter().copied(), skip_unknown)?,
            ConfiguredPredictor::Chars(p) => {
                train_stream(p, decode_utf8(input)?.chars(), skip_unknown)?
            }
        };
        Ok(self.report_since(&before, skipped))
    }

    fn report_since(&self, before: &PredictorStats, skipped: u64) -> EvaluationReport {
        let after = self.stats();
        let symbols = after.steps - before.steps;
        let total_bits = after.total_log_loss_bits - before.total_log_loss_bits;
        let baseline_bits = after.baseline_log_loss_bits - before.baseline_log_loss_bits;
        let per_symbol = |bits: f64| {
            if symbols == 0 {
                0.0
            } else {
                bits / symbols as f64
            }
        };
        let bits_per_symbol = per_symbol(total_bits);
        EvaluationReport {
            symbols,
            skipped,
            total_bits,
            bits_per_symbol,
            baseline_bits_per_symbol: per_symbol(baseline_bits),
            regret_bits: total_bits - baseline_bits,
            compression_ratio: match self.kind() {
                SymbolKind::Bytes if bits_per_symbol > 0.0 => Some(8.0 / bits_per_symbol),
                _ => None,
            },
            node_count: after.node_count,
            max_depth_reached: after.max_depth_reached,
        }
    }

    /// Append the symbols of `input` to the context without training,
    /// skipping ones outside the alphabet.
    pub fn prime(&mut self, input: &[u8]) -> Result<()> {
        match self {
            ConfiguredPredictor::Bytes(p) => prime_stream(p, input.iter().copied()),
            ConfiguredPredictor::Chars(p) => prime_stream(p, decode_utf8(input)?.chars()),
        }
    }

    /// Sample `len` symbols and encode them as bytes (UTF-8 for characters).
    pub fn generate<R: Rng + ?Sized>(&self, len: usize, rejection: bool, rng: &mut R) -> Vec<u8> {
        match self {
            ConfiguredPredictor::Bytes(p) => p.generate(len, rejection, rng),
            ConfiguredPredictor::Chars(p) => p
                .generate(len, rejection, rng)
                .into_iter()
                .collect::<String>()
                .into_bytes(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let saved = match self {
            ConfiguredPredictor::Bytes(p) => SavedModel::Bytes(p.to_snapshot()),
            ConfiguredPredictor::Chars(p) => SavedModel::Chars(p.to_snapshot()),
        };
        write_json(path, &saved)?;
        debug!(path = %path.display(), kind = %self.kind(), "saved model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model = match read_json::<SavedModel>(path)? {
            SavedModel::Bytes(s) => ConfiguredPredictor::Bytes(SequentialPredictor::from_snapshot(s)?),
            SavedModel::Chars(s) => ConfiguredPredictor::Chars(SequentialPredictor::from_snapshot(s)?),
        };
        debug!(path = %path.display(), kind = %model.kind(), "loaded model");
        Ok(model)
    }
}

fn decode_utf8(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("input is not valid UTF-8: {}", e),
        ))
    })
}

fn train_stream<S: crate::alphabet::Symbol>(
    predictor: &mut SequentialPredictor<S>,
    symbols: impl Iterator<Item = S>,
    skip_unknown: bool,
) -> Result<u64> {
    let mut skipped = 0;
    for symbol in symbols {
        if skip_unknown && !predictor.alphabet().contains(&symbol) {
            skipped += 1;
            continue;
        }
        predictor.update(&symbol)?;
    }
    if skipped > 0 {
        debug!(skipped, "dropped symbols outside the alphabet");
    }
    Ok(skipped)
}

fn prime_stream<S: crate::alphabet::Symbol>(
    predictor: &mut SequentialPredictor<S>,
    symbols: impl Iterator<Item = S>,
) -> Result<()> {
    for symbol in symbols {
        if predictor.alphabet().contains(&symbol) {
            predictor.observe(&symbol)?;
        }
    }
    Ok(())
}
