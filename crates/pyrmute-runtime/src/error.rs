// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the runtime support library and the evaluator.
//!
//! The fallback functions do not recover from a failed mutation: when a
//! value supports neither evolution nor in-place update, the error of the
//! underlying operation is returned to the call site.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A name was read before it was bound.
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    /// An import named a path the registry does not provide.
    #[error("cannot import '{0}'")]
    Import(String),

    /// Attribute lookup, assignment or deletion failed.
    #[error("'{type_name}' object has no attribute '{name}'")]
    Attribute { type_name: String, name: String },

    /// A mapping lookup or deletion with a missing key.
    #[error("key {0} not found")]
    Key(String),

    /// A sequence index outside the sequence.
    #[error("index {index} out of range for length {len}")]
    Index { index: i64, len: usize },

    /// An operation applied to a value of the wrong type.
    #[error("{0}")]
    Type(String),

    /// A construct the evaluator does not execute.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl RuntimeError {
    pub(crate) fn attribute(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        RuntimeError::Attribute {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type(message.into())
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
