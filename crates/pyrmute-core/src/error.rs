// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the core tree model.

use thiserror::Error;

pub use crate::config::ConfigError;

/// Errors raised while loading trees or configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The tree handed over by the parser is not valid JSON for [`crate::ast::Module`].
    #[error("invalid tree: {0}")]
    InvalidTree(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
