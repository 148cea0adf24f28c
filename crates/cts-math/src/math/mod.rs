//! Core math modules.

pub mod estimator;
pub mod prior;
pub mod stable;
pub mod switching;
