//! Switching weights for context tree switching.
//!
//! Each tree node mixes two predictors: its own estimator ("stay") and the
//! mixture of the next-deeper context ("split"). The weight `w` is the
//! posterior mass on "stay":
//!
//! ```text
//! P_mix(x) = w · P_own(x) + (1 - w) · P_child(x)
//! ```
//!
//! After observing `x`, Bayes' rule with a switch rate `α` moves a fraction
//! of each hypothesis' mass to the other one:
//!
//! ```text
//! stay'  = (1 - α) · w · P_own(x)       + α · (1 - w) · P_child(x)
//! split' = (1 - α) · (1 - w) · P_child(x) + α · w · P_own(x)
//! w'     = stay' / (stay' + split')
//! ```
//!
//! With α = 0 this is a plain Bayesian mixture (the CTW node recursion with
//! adaptive weights). Weights are stored as normalised log masses so long
//! runs with α = 0 cannot underflow to exactly 0 or 1.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

use super::stable::log_add_exp;

/// Schedule for the switch rate α.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchRate {
    /// α_t = 1 / (t + 1), with t the 1-based update count.
    #[default]
    Decaying,
    /// Constant α in [0, 1).
    Fixed(f64),
}

impl SwitchRate {
    /// Switch rate for the `step`-th update (1-based).
    pub fn alpha(&self, step: u64) -> f64 {
        match self {
            SwitchRate::Decaying => 1.0 / (step.max(1) as f64 + 1.0),
            SwitchRate::Fixed(alpha) => *alpha,
        }
    }

    /// Whether the schedule is usable.
    pub fn is_valid(&self) -> bool {
        match self {
            SwitchRate::Decaying => true,
            SwitchRate::Fixed(alpha) => alpha.is_finite() && *alpha >= 0.0 && *alpha < 1.0,
        }
    }
}

impl std::str::FromStr for SwitchRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("decaying") {
            return Ok(SwitchRate::Decaying);
        }
        let alpha: f64 = trimmed
            .parse()
            .map_err(|_| format!("unknown switch rate: {}", trimmed))?;
        let rate = SwitchRate::Fixed(alpha);
        if rate.is_valid() {
            Ok(rate)
        } else {
            Err(format!("switch rate must be in [0, 1), got {}", alpha))
        }
    }
}

impl std::fmt::Display for SwitchRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchRate::Decaying => write!(f, "decaying"),
            SwitchRate::Fixed(alpha) => write!(f, "{}", alpha),
        }
    }
}

/// Normalised stay/split masses of one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwitchingWeight {
    log_stay: f64,
    log_split: f64,
}

impl Default for SwitchingWeight {
    fn default() -> Self {
        Self {
            log_stay: -LN_2,
            log_split: -LN_2,
        }
    }
}

impl SwitchingWeight {
    /// Even prior: w = 1/2.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a weight from stored log masses.
    ///
    /// Returns None if the masses are NaN, positive, or not normalised.
    pub fn from_log_parts(log_stay: f64, log_split: f64) -> Option<Self> {
        if log_stay.is_nan() || log_split.is_nan() || log_stay > 0.0 || log_split > 0.0 {
            return None;
        }
        if log_add_exp(log_stay, log_split).abs() > 1e-9 {
            return None;
        }
        Some(Self { log_stay, log_split })
    }

    /// Posterior mass w on the node's own estimator.
    pub fn stay(&self) -> f64 {
        self.log_stay.exp()
    }

    /// Posterior mass 1 - w on the deeper context.
    pub fn split(&self) -> f64 {
        self.log_split.exp()
    }

    /// Log masses `(ln w, ln(1 - w))`.
    pub fn log_parts(&self) -> (f64, f64) {
        (self.log_stay, self.log_split)
    }

    /// Mixed predictive probability.
    pub fn mix(&self, own: f64, child: f64) -> f64 {
        self.stay() * own + self.split() * child
    }

    /// Posterior update after a symbol was assigned `own` by the node's
    /// estimator and `child` by the deeper mixture.
    pub fn update(&mut self, own: f64, child: f64, alpha: f64) {
        let log_own = own.ln();
        let log_child = child.ln();

        let (stay, split) = if alpha <= 0.0 {
            (self.log_stay + log_own, self.log_split + log_child)
        } else {
            let log_keep = (1.0 - alpha).ln();
            let log_switch = alpha.ln();
            (
                log_add_exp(
                    log_keep + log_own + self.log_stay,
                    log_switch + log_child + self.log_split,
                ),
                log_add_exp(
                    log_keep + log_child + self.log_split,
                    log_switch + log_own + self.log_stay,
                ),
            )
        };

        let norm = log_add_exp(stay, split);
        if norm.is_finite() {
            self.log_stay = stay - norm;
            self.log_split = split - norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_starts_even() {
        let w = SwitchingWeight::new();
        assert!(approx_eq(w.stay(), 0.5, 1e-15));
        assert!(approx_eq(w.mix(0.2, 0.6), 0.4, 1e-15));
    }

    #[test]
    fn test_bayes_update_without_switching() {
        let mut w = SwitchingWeight::new();
        w.update(0.2, 0.6, 0.0);
        // 0.5*0.2 / (0.5*0.2 + 0.5*0.6)
        assert!(approx_eq(w.stay(), 0.25, 1e-12));
        assert!(approx_eq(w.stay() + w.split(), 1.0, 1e-12));
    }

    #[test]
    fn test_switch_rate_pulls_toward_other_hypothesis() {
        let mut plain = SwitchingWeight::new();
        let mut switching = SwitchingWeight::new();
        for _ in 0..50 {
            plain.update(0.1, 0.9, 0.0);
            switching.update(0.1, 0.9, 0.05);
        }
        assert!(plain.stay() < 1e-40);
        // The switch rate keeps a floor near α on "stay".
        assert!(switching.stay() > 0.04);
        assert!(switching.stay() < 0.07);
    }

    #[test]
    fn test_matches_linear_recursion() {
        let mut w = SwitchingWeight::new();
        let alpha = 0.1;
        let (own, child) = (0.3, 0.7);
        let stay = (1.0 - alpha) * 0.5 * own + alpha * 0.5 * child;
        let split = (1.0 - alpha) * 0.5 * child + alpha * 0.5 * own;
        w.update(own, child, alpha);
        assert!(approx_eq(w.stay(), stay / (stay + split), 1e-12));
    }

    #[test]
    fn test_equal_evidence_keeps_even_weight() {
        let mut w = SwitchingWeight::new();
        w.update(0.4, 0.4, 0.2);
        assert!(approx_eq(w.stay(), 0.5, 1e-12));
    }

    #[test]
    fn test_decaying_schedule() {
        let rate = SwitchRate::Decaying;
        assert!(approx_eq(rate.alpha(1), 0.5, 1e-15));
        assert!(approx_eq(rate.alpha(3), 0.25, 1e-15));
        assert!(approx_eq(SwitchRate::Fixed(0.05).alpha(1000), 0.05, 1e-15));
    }

    #[test]
    fn test_switch_rate_validation_and_parse() {
        assert!(SwitchRate::Fixed(0.0).is_valid());
        assert!(!SwitchRate::Fixed(1.0).is_valid());
        assert!(!SwitchRate::Fixed(-0.1).is_valid());
        assert_eq!("decaying".parse::<SwitchRate>(), Ok(SwitchRate::Decaying));
        assert_eq!("0.02".parse::<SwitchRate>(), Ok(SwitchRate::Fixed(0.02)));
        assert!("1.5".parse::<SwitchRate>().is_err());
        assert!("sometimes".parse::<SwitchRate>().is_err());
    }

    #[test]
    fn test_from_log_parts_validates() {
        let w = SwitchingWeight::new();
        let (s, p) = w.log_parts();
        assert_eq!(SwitchingWeight::from_log_parts(s, p), Some(w));
        assert!(SwitchingWeight::from_log_parts(0.0, 0.0).is_none());
        assert!(SwitchingWeight::from_log_parts(f64::NAN, 0.0).is_none());
        assert!(SwitchingWeight::from_log_parts(0.0, f64::NEG_INFINITY).is_some());
    }
}
