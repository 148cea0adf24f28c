//! Ordered symbol alphabets.
//!
//! Every model works on symbol indices internally; the alphabet is the only
//! place symbols are mapped to and from indices. The order given at
//! construction is the order used for sampling and for distributions.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Anything usable as a symbol.
pub trait Symbol: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Symbol for T {}

/// A fixed, non-empty, duplicate-free ordered set of symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet<S: Symbol> {
    symbols: Vec<S>,
    index: HashMap<S, usize>,
}

impl<S: Symbol> Alphabet<S> {
    /// Build an alphabet, rejecting empty input and repeated symbols.
    pub fn new(symbols: impl IntoIterator<Item = S>) -> Result<Self> {
        let symbols: Vec<S> = symbols.into_iter().collect();
        if symbols.is_empty() {
            return Err(Error::invalid_config(
                "alphabet",
                "must contain at least one symbol",
            ));
        }

        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.clone(), i).is_some() {
                return Err(Error::invalid_config(
                    "alphabet",
                    format!("duplicate symbol {:?}", symbol),
                ));
            }
        }
        Ok(Self { symbols, index })
    }

    /// Number of symbols A.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed alphabet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, symbol: &S) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    /// Like [`Alphabet::index_of`] but reports unknown symbols as errors.
    pub fn require_index(&self, symbol: &S) -> Result<usize> {
        self.index_of(symbol)
            .ok_or_else(|| Error::invalid_symbol(symbol))
    }

    pub fn symbol_at(&self, index: usize) -> Option<&S> {
        self.symbols.get(index)
    }

    pub fn contains(&self, symbol: &S) -> bool {
        self.index.contains_key(symbol)
    }

    /// Symbols in canonical order.
    pub fn symbols(&self) -> &[S] {
        &self.symbols
    }
}

impl Alphabet<u8> {
    /// All 256 byte values in ascending order.
    pub fn bytes() -> Self {
        let symbols: Vec<u8> = (0..=u8::MAX).collect();
        let index = symbols.iter().map(|&b| (b, b as usize)).collect();
        Self { symbols, index }
    }
}

impl Alphabet<char> {
    /// Characters of `symbols` in order of appearance.
    pub fn from_chars(symbols: &str) -> Result<Self> {
        Self::new(symbols.chars())
    }
}

impl<S: Symbol + Serialize> Serialize for Alphabet<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        self.symbols.serialize(serializer)
    }
}

impl<'de, S: Symbol + Deserialize<'de>> Deserialize<'de> for Alphabet<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let symbols = Vec::<S>::deserialize(deserializer)?;
        Alphabet::new(symbols).map_err(D::Error::custom)
    }
}
