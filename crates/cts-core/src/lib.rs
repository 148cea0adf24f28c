//! Context Tree Switching sequence model.
//!
//! An online predictor for symbol streams: after every symbol it reports the
//! probability it had assigned to that symbol, learns from it, and can sample
//! plausible continuations. Predictions mix variable-order contexts up to a
//! fixed maximum length, with per-context switching weights that let the
//! model change its preferred order as the stream changes.
//!
//! ```
//! use cts_core::{Alphabet, SequentialPredictor};
//!
//! let alphabet = Alphabet::from_chars("ab").unwrap();
//! let mut model = SequentialPredictor::with_defaults(alphabet, 0).unwrap();
//! let lp = model.update(&'a').unwrap();
//! assert!((lp.exp() - 0.5).abs() < 1e-12);
//! ```

pub mod alphabet;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod predictor;
pub mod shared;
pub mod snapshot;
pub mod tree;

pub use alphabet::{Alphabet, Symbol};
pub use context::{ContextSnapshot, SequenceContext};
pub use error::{Error, ErrorCategory, Result};
pub use model::{ConfiguredPredictor, EvaluationReport, SavedModel, SymbolKind};
pub use predictor::{BatchResult, LossTracker, PredictorStats, SequentialPredictor, UpdateResult};
pub use shared::SharedPredictor;
pub use snapshot::{ModelSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use tree::ContextTree;

pub use cts_math::{PriorPolicy, SwitchRate};
