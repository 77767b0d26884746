// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the rewrite engine.
//!
//! Every error aborts the rewrite of the current unit: there is no partial
//! output and no import statements are emitted.

use pyrmute_core::{ConfigError, Location, NodeKind};
use thiserror::Error;

/// Errors raised while compiling a [`crate::pattern::Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The same capture name appears twice in one pattern.
    #[error("capture '{0}' is used more than once in one pattern")]
    DuplicateCapture(String),

    /// A node pattern constrains a field its kind does not have.
    #[error("{kind} has no field '{field}'")]
    UnknownField { kind: NodeKind, field: String },
}

/// Errors raised while rewriting a unit.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A node reached a rewrite step that cannot accept its shape.
    #[error("unexpected {kind} at {loc} in {context}")]
    UnexpectedNode {
        kind: NodeKind,
        loc: Location,
        context: &'static str,
    },

    /// A configured symbol path or prefix is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The unit has no top-level function with the requested name.
    #[error("no top-level function named '{0}'")]
    FunctionNotFound(String),

    /// A built-in pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl RewriteError {
    pub(crate) fn unexpected(kind: NodeKind, loc: Location, context: &'static str) -> Self {
        RewriteError::UnexpectedNode { kind, loc, context }
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_kind() {
        let err = RewriteError::from(ConfigError::InvalidPrefix("1x".to_string()));
        assert!(matches!(err, RewriteError::Config(ConfigError::InvalidPrefix(ref p)) if p == "1x"));
        assert_eq!(err.to_string(), "invalid name prefix '1x'");
    }
}
