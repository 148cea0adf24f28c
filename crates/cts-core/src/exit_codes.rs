//! Exit codes for the `cts` CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (fixable by changing arguments or data)
//! - 20-29: Internal and environment errors

use crate::error::Error;

/// Exit codes for `cts` commands.
///
/// These codes are a stable contract for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Clean = 0,

    /// Invalid arguments or configuration.
    ArgsError = 10,

    /// Input contained a symbol outside the model alphabet.
    SymbolError = 11,

    /// Saved model could not be used.
    SnapshotError = 12,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// User/input errors (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::SymbolError => "ERR_SYMBOL",
            ExitCode::SnapshotError => "ERR_SNAPSHOT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidConfiguration { .. } => ExitCode::ArgsError,
            Error::Config(cts_config::ValidationError::IoError(_)) => ExitCode::IoError,
            Error::Config(_) => ExitCode::ArgsError,
            Error::InvalidSymbol { .. } => ExitCode::SymbolError,
            Error::SnapshotMismatch(_) => ExitCode::SnapshotError,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::SnapshotError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::SymbolError.as_i32(), 11);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from(&Error::invalid_symbol(&'q')),
            ExitCode::SymbolError
        );
        assert_eq!(
            ExitCode::from(&Error::invalid_config("alphabet", "empty")),
            ExitCode::ArgsError
        );
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
        let missing = Error::Config(cts_config::ValidationError::IoError("gone".into()));
        assert_eq!(ExitCode::from(&missing), ExitCode::IoError);
    }

    #[test]
    fn test_classification() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::SnapshotError.is_user_error());
        assert!(!ExitCode::IoError.is_user_error());
        assert_eq!(ExitCode::SymbolError.code_name(), "ERR_SYMBOL");
    }
}
