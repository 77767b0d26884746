// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Rewrite engine for pyrmute.
//!
//! Turns mutation-shaped code into code that evolves persistent values,
//! falling back to in-place mutation at runtime when a value cannot evolve.
//!
//! - Structural matching with captures ([`pattern`])
//! - Collision-free temporaries and import synthesis ([`names`])
//! - Slice and extended-slice normalization ([`subscript`])
//! - The driver and the four statement/expression rewrites ([`transformer`])
//! - Function rewriting with an explicit re-entry guard ([`guard`])

pub mod effects;
pub mod error;
pub mod guard;
pub mod names;
pub mod pattern;
pub mod subscript;
pub mod transformer;

mod assign;
mod delete;
mod literal;
mod method_call;

pub use error::{PatternError, RewriteError, RewriteResult};
pub use guard::{rewrite_function, GuardScope, RewriteGuard, RewriteOptions, Rewritten};
pub use method_call::method_call_pattern;
pub use names::{reserve_existing, Names};
pub use pattern::{Captures, LeafValue, Matcher, Pattern};
pub use subscript::normalize;
pub use transformer::{rewrite, rewrite_module, RewriteOutput, Rewriter};
