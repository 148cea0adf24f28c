//! Sequential categorical estimator (Dirichlet-multinomial predictive rule).
//!
//! For a node that has seen `N` symbols, `n_i` of which were symbol `i`, the
//! predictive probability under a symmetric Dirichlet(α) prior over an
//! alphabet of size `A` is
//!
//! ```text
//! P(i) = (n_i + α) / (N + A·α)
//! ```
//!
//! With α = 1/2 this is the Krichevsky–Trofimov estimator. Counts are kept
//! sparse: deep context nodes typically see only a handful of distinct
//! symbols even on a 256-symbol alphabet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::prior::PriorPolicy;

/// Prior parameters shared by all estimators of one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorParams {
    /// Pseudo-count α added to every symbol.
    pub pseudo_count: f64,
    /// Alphabet size A.
    pub alphabet_size: usize,
}

impl EstimatorParams {
    /// Resolve a prior policy against an alphabet size.
    pub fn new(prior: PriorPolicy, alphabet_size: usize) -> Self {
        Self {
            pseudo_count: prior.pseudo_count(alphabet_size),
            alphabet_size,
        }
    }

    /// Total prior mass A·α.
    pub fn prior_mass(&self) -> f64 {
        self.alphabet_size as f64 * self.pseudo_count
    }
}

/// Per-context symbol counts.
///
/// Deserialization rejects a stored `total` that differs from the sum of the
/// stored counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCounts")]
pub struct LocalEstimator {
    counts: BTreeMap<usize, u64>,
    total: u64,
}

#[derive(Deserialize)]
struct StoredCounts {
    counts: BTreeMap<usize, u64>,
    total: u64,
}

impl TryFrom<StoredCounts> for LocalEstimator {
    type Error = String;

    fn try_from(stored: StoredCounts) -> Result<Self, Self::Error> {
        let sum = stored
            .counts
            .values()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
            .ok_or_else(|| "symbol counts overflow".to_string())?;
        if sum != stored.total {
            return Err(format!(
                "symbol counts sum to {} but total is {}",
                sum, stored.total
            ));
        }
        Ok(Self::from_counts(stored.counts))
    }
}

impl LocalEstimator {
    /// Create an estimator with no observations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an estimator from raw counts, recomputing the cached total.
    pub fn from_counts(counts: BTreeMap<usize, u64>) -> Self {
        let total = counts.values().sum();
        let counts = counts.into_iter().filter(|&(_, c)| c > 0).collect();
        Self { counts, total }
    }

    /// Predictive probability of `symbol` given the counts so far.
    pub fn predict(&self, symbol: usize, params: &EstimatorParams) -> f64 {
        let count = self.count(symbol) as f64;
        (count + params.pseudo_count) / (self.total as f64 + params.prior_mass())
    }

    /// Predictive probabilities for every symbol, in index order.
    pub fn distribution(&self, params: &EstimatorParams) -> Vec<f64> {
        let denom = self.total as f64 + params.prior_mass();
        let mut probs = vec![params.pseudo_count / denom; params.alphabet_size];
        for (&symbol, &count) in &self.counts {
            if let Some(p) = probs.get_mut(symbol) {
                *p = (count as f64 + params.pseudo_count) / denom;
            }
        }
        probs
    }

    /// Record one occurrence of `symbol`.
    pub fn observe(&mut self, symbol: usize) {
        *self.counts.entry(symbol).or_insert(0) += 1;
        self.total += 1;
    }

    /// Raw count of `symbol` (no pseudo-count).
    pub fn count(&self, symbol: usize) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Number of observations N.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether no symbol has been observed.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Symbols with a nonzero raw count, in index order.
    pub fn seen_symbols(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts.keys().copied()
    }

    /// Raw counts keyed by symbol index.
    pub fn counts(&self) -> &BTreeMap<usize, u64> {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_empty_estimator_is_pure_prior() {
        let est = LocalEstimator::new();
        let params = EstimatorParams::new(PriorPolicy::Laplace, 4);
        for s in 0..4 {
            assert!(approx_eq(est.predict(s, &params), 0.25, 1e-12));
        }
    }

    #[test]
    fn test_kt_binary_sequence() {
        let params = EstimatorParams::new(PriorPolicy::Jeffreys, 2);
        let mut est = LocalEstimator::new();

        assert!(approx_eq(est.predict(0, &params), 0.5, 1e-12));
        est.observe(0);
        assert!(approx_eq(est.predict(0, &params), 0.75, 1e-12));
        assert!(approx_eq(est.predict(1, &params), 0.25, 1e-12));
        est.observe(0);
        assert!(approx_eq(est.predict(0, &params), 2.5 / 3.0, 1e-12));
    }

    #[test]
    fn test_perks_matches_closed_form() {
        let params = EstimatorParams::new(PriorPolicy::Perks, 4);
        let mut est = LocalEstimator::new();
        est.observe(2);
        est.observe(2);
        est.observe(1);
        // (2 + 0.25) / (3 + 1)
        assert!(approx_eq(est.predict(2, &params), 2.25 / 4.0, 1e-12));
        assert!(approx_eq(est.predict(3, &params), 0.25 / 4.0, 1e-12));
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let params = EstimatorParams::new(PriorPolicy::Fixed(0.01), 10);
        let mut est = LocalEstimator::new();
        for s in [3, 3, 7, 9, 3, 0] {
            est.observe(s);
        }
        let dist = est.distribution(&params);
        assert_eq!(dist.len(), 10);
        assert!(approx_eq(dist.iter().sum::<f64>(), 1.0, 1e-12));
        for (s, p) in dist.iter().enumerate() {
            assert!(approx_eq(*p, est.predict(s, &params), 1e-15));
        }
    }

    #[test]
    fn test_counts_and_seen_symbols() {
        let mut est = LocalEstimator::new();
        assert!(est.is_empty());
        est.observe(5);
        est.observe(1);
        est.observe(5);
        assert_eq!(est.total(), 3);
        assert_eq!(est.count(5), 2);
        assert_eq!(est.count(0), 0);
        assert_eq!(est.seen_symbols().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn test_from_counts_recomputes_total() {
        let mut counts = BTreeMap::new();
        counts.insert(0, 3);
        counts.insert(4, 0);
        counts.insert(2, 1);
        let est = LocalEstimator::from_counts(counts);
        assert_eq!(est.total(), 4);
        assert_eq!(est.seen_symbols().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_total() {
        let ok: LocalEstimator =
            serde_json::from_str(r#"{"counts": {"0": 2, "3": 1}, "total": 3}"#).unwrap();
        assert_eq!(ok.total(), 3);
        assert_eq!(ok.count(3), 1);

        let tampered = r#"{"counts": {"0": 1000, "3": 1}, "total": 3}"#;
        let err = serde_json::from_str::<LocalEstimator>(tampered).unwrap_err();
        assert!(err.to_string().contains("sum to 1001"), "{err}");

        let overflow = r#"{"counts": {"0": 18446744073709551615, "1": 1}, "total": 0}"#;
        assert!(serde_json::from_str::<LocalEstimator>(overflow).is_err());
    }

    #[test]
    fn test_serialized_form_round_trips() {
        let mut est = LocalEstimator::new();
        for s in [1, 1, 4] {
            est.observe(s);
        }
        let json = serde_json::to_string(&est).unwrap();
        assert_eq!(serde_json::from_str::<LocalEstimator>(&json).unwrap(), est);
    }
}
