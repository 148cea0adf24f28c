//! Error types for the sequence model.
//!
//! Every error carries a stable numeric code and a category so the CLI can
//! report failures in JSON without parsing messages:
//! ```json
//! {
//!   "code": 20,
//!   "category": "symbol",
//!   "message": "symbol 'z' is not in the alphabet",
//!   "recoverable": false
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model construction parameters.
    Config,
    /// Symbols outside the alphabet.
    Symbol,
    /// Saved model files.
    Snapshot,
    /// File I/O and serialization.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Symbol => write!(f, "symbol"),
            ErrorCategory::Snapshot => write!(f, "snapshot"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the model and its CLI.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    #[error("configuration error: {0}")]
    Config(#[from] cts_config::ValidationError),

    // Symbol errors (20-29)
    #[error("symbol {symbol} is not in the alphabet")]
    InvalidSymbol { symbol: String },

    // Snapshot errors (30-39)
    #[error("model snapshot rejected: {0}")]
    SnapshotMismatch(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfiguration`].
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::InvalidSymbol`] rendered with `Debug`.
    pub fn invalid_symbol<S: std::fmt::Debug>(symbol: &S) -> Self {
        Error::InvalidSymbol {
            symbol: format!("{:?}", symbol),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// - 10-19: Configuration errors
    /// - 20-29: Symbol errors
    /// - 30-39: Snapshot errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidConfiguration { .. } => 10,
            Error::Config(_) => 11,
            Error::InvalidSymbol { .. } => 20,
            Error::SnapshotMismatch(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfiguration { .. } | Error::Config(_) => ErrorCategory::Config,
            Error::InvalidSymbol { .. } => ErrorCategory::Symbol,
            Error::SnapshotMismatch(_) => ErrorCategory::Snapshot,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether retrying the same call could succeed.
    ///
    /// Contract violations never are: the same inputs fail the same way.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidConfiguration { .. } => false,
            Error::Config(_) => false,
            Error::InvalidSymbol { .. } => false,
            Error::SnapshotMismatch(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Structured form for JSON output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category(),
            "message": self.to_string(),
            "recoverable": self.is_recoverable(),
        })
    }
}
