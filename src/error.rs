//! Unified error type and exit codes for pyrmute.
//!
//! Errors from the core, rewrite and runtime crates are bridged into
//! [`PyrmuteError`] so the CLI can render every failure the same way.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, bad configuration)
//! - `3`: Input not found
//! - `4`: Invalid input tree
//! - `5`: Execution of a unit failed
//! - `6`: Rewrite failed
//! - `10`: Internal errors (I/O, unexpected state)

use std::fmt;
use std::path::Path;

use pyrmute_core::{ConfigError, CoreError};
use pyrmute_rewrite::RewriteError;
use pyrmute_runtime::RuntimeError;
use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes; they are the process exit codes and appear in JSON
/// error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// An input path does not exist.
    NotFound = 3,
    /// An input file is not a valid tree.
    InvalidInput = 4,
    /// The evaluator failed while executing a unit.
    ExecutionFailed = 5,
    /// The rewrite aborted.
    RewriteFailed = 6,
    /// Internal errors.
    InternalError = 10,
}

impl OutputErrorCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum PyrmuteError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An input path does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// An input file does not hold a valid tree.
    #[error("invalid tree in {path}: {message}")]
    InvalidTree { path: String, message: String },

    /// The rewrite of a unit aborted.
    #[error("rewrite failed for {path}: {source}")]
    Rewrite {
        path: String,
        #[source]
        source: RewriteError,
    },

    /// Executing a unit failed.
    #[error("execution failed for {path}: {source}")]
    Execution {
        path: String,
        #[source]
        source: RuntimeError,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PyrmuteError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        PyrmuteError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: &Path) -> Self {
        PyrmuteError::FileNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn io(path: &Path, err: std::io::Error) -> Self {
        PyrmuteError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn rewrite(path: &Path, source: RewriteError) -> Self {
        match source {
            RewriteError::Config(err) => PyrmuteError::Config(err),
            source => PyrmuteError::Rewrite {
                path: path.display().to_string(),
                source,
            },
        }
    }

    pub fn execution(path: &Path, source: RuntimeError) -> Self {
        PyrmuteError::Execution {
            path: path.display().to_string(),
            source,
        }
    }

    /// Attach a path to an error raised while loading a tree.
    pub fn from_core(path: &Path, err: CoreError) -> Self {
        match err {
            CoreError::InvalidTree(err) => PyrmuteError::InvalidTree {
                path: path.display().to_string(),
                message: err.to_string(),
            },
            CoreError::Config(err) => PyrmuteError::Config(err),
        }
    }

    /// The path the error concerns, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            PyrmuteError::FileNotFound { path }
            | PyrmuteError::InvalidTree { path, .. }
            | PyrmuteError::Rewrite { path, .. }
            | PyrmuteError::Execution { path, .. }
            | PyrmuteError::Io { path, .. } => Some(path),
            PyrmuteError::InvalidArguments { .. }
            | PyrmuteError::Config(_)
            | PyrmuteError::Internal { .. } => None,
        }
    }

    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&PyrmuteError> for OutputErrorCode {
    fn from(err: &PyrmuteError) -> Self {
        match err {
            PyrmuteError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            PyrmuteError::Config(_) => OutputErrorCode::InvalidArguments,
            PyrmuteError::FileNotFound { .. } => OutputErrorCode::NotFound,
            PyrmuteError::InvalidTree { .. } => OutputErrorCode::InvalidInput,
            PyrmuteError::Execution { .. } => OutputErrorCode::ExecutionFailed,
            PyrmuteError::Rewrite { .. } => OutputErrorCode::RewriteFailed,
            PyrmuteError::Io { .. } => OutputErrorCode::InternalError,
            PyrmuteError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

// ============================================================================
// Bridges without a path
// ============================================================================

impl From<CoreError> for PyrmuteError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTree(err) => PyrmuteError::InvalidTree {
                path: "<input>".to_string(),
                message: err.to_string(),
            },
            CoreError::Config(err) => PyrmuteError::Config(err),
        }
    }
}

impl From<RewriteError> for PyrmuteError {
    fn from(err: RewriteError) -> Self {
        PyrmuteError::rewrite(Path::new("<input>"), err)
    }
}

impl From<RuntimeError> for PyrmuteError {
    fn from(err: RuntimeError) -> Self {
        PyrmuteError::Execution {
            path: "<input>".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::NotFound.code(), 3);
        assert_eq!(OutputErrorCode::InvalidInput.code(), 4);
        assert_eq!(OutputErrorCode::ExecutionFailed.code(), 5);
        assert_eq!(OutputErrorCode::RewriteFailed.code(), 6);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
    }

    #[test]
    fn bridged_errors_map_to_codes() {
        let err = PyrmuteError::from(RewriteError::FunctionNotFound("f".to_string()));
        assert_eq!(err.error_code(), OutputErrorCode::RewriteFailed);
        assert_eq!(err.path(), Some("<input>"));

        let err = PyrmuteError::from(RuntimeError::UndefinedName("x".to_string()));
        assert_eq!(err.error_code(), OutputErrorCode::ExecutionFailed);

        let config = ConfigError::InvalidPrefix("1x".to_string());
        let err = PyrmuteError::from(config);
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        assert_eq!(err.path(), None);

        let config = RewriteError::from(ConfigError::InvalidPrefix("1x".to_string()));
        let err = PyrmuteError::rewrite(Path::new("unit.json"), config);
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }

    #[test]
    fn invalid_tree_keeps_the_path() {
        let core = pyrmute_core::Module::from_json("{").unwrap_err();
        let err = PyrmuteError::from_core(Path::new("unit.json"), core);
        assert_eq!(err.error_code(), OutputErrorCode::InvalidInput);
        assert_eq!(err.path(), Some("unit.json"));
        assert!(err.to_string().starts_with("invalid tree in unit.json"));
    }
}
