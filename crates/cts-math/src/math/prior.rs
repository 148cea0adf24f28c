//! Symmetric Dirichlet priors for categorical symbol estimators.
//!
//! Every local estimator in a context tree adds the same pseudo-count `α` to
//! each symbol before any observation. The policy decides how `α` depends on
//! the alphabet size `A`:
//!
//! | Policy   | α      |
//! |----------|--------|
//! | Perks    | 1 / A  |
//! | Laplace  | 1      |
//! | Jeffreys | 1 / 2  |
//! | Fixed(v) | v      |
//!
//! Perks is the default: the prior mass `A·α` is always 1, so a single
//! observation moves the prediction a long way on large alphabets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-count scheme shared by every local estimator of a model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorPolicy {
    /// α = 1/A.
    #[default]
    Perks,
    /// α = 1.
    Laplace,
    /// α = 1/2 (Krichevsky–Trofimov).
    Jeffreys,
    /// Explicit positive pseudo-count.
    Fixed(f64),
}

impl PriorPolicy {
    /// All named (token) policies.
    pub const NAMED: &'static [PriorPolicy] = &[
        PriorPolicy::Perks,
        PriorPolicy::Laplace,
        PriorPolicy::Jeffreys,
    ];

    /// Create a fixed pseudo-count policy.
    ///
    /// Returns None unless the value is finite and strictly positive.
    pub fn fixed(value: f64) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(PriorPolicy::Fixed(value))
        } else {
            None
        }
    }

    /// Pseudo-count added to each symbol for an alphabet of `alphabet_size`.
    pub fn pseudo_count(&self, alphabet_size: usize) -> f64 {
        match self {
            PriorPolicy::Perks => 1.0 / alphabet_size.max(1) as f64,
            PriorPolicy::Laplace => 1.0,
            PriorPolicy::Jeffreys => 0.5,
            PriorPolicy::Fixed(value) => *value,
        }
    }

    /// Whether the policy yields a usable pseudo-count.
    pub fn is_valid(&self) -> bool {
        match self {
            PriorPolicy::Fixed(value) => value.is_finite() && *value > 0.0,
            _ => true,
        }
    }

    /// Token name, or None for a fixed value.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            PriorPolicy::Perks => Some("perks"),
            PriorPolicy::Laplace => Some("laplace"),
            PriorPolicy::Jeffreys => Some("jeffreys"),
            PriorPolicy::Fixed(_) => None,
        }
    }
}

impl std::str::FromStr for PriorPolicy {
    type Err = String;

    /// Parse a prior token (`perks`, `laplace`, `jeffreys`, also `kt`) or a
    /// positive numeric pseudo-count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "perks" => return Ok(PriorPolicy::Perks),
            "laplace" => return Ok(PriorPolicy::Laplace),
            "jeffreys" | "kt" => return Ok(PriorPolicy::Jeffreys),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(value) => PriorPolicy::fixed(value)
                .ok_or_else(|| format!("pseudo-count must be positive and finite, got {}", value)),
            Err(_) => Err(format!("unknown symbol prior: {}", trimmed)),
        }
    }
}

impl fmt::Display for PriorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorPolicy::Fixed(value) => write!(f, "{}", value),
            named => write!(f, "{}", named.token().unwrap_or("fixed")),
        }
    }
}
