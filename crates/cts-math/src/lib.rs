//! Numerical building blocks for context tree switching.
//!
//! - Log-domain helpers and unit conversions
//! - Symbol priors (`PriorPolicy`)
//! - Sparse categorical estimators (`LocalEstimator`)
//! - Switching weights and switch-rate schedules

pub mod math;

pub use math::estimator::{EstimatorParams, LocalEstimator};
pub use math::prior::PriorPolicy;
pub use math::stable::*;
pub use math::switching::{SwitchRate, SwitchingWeight};
