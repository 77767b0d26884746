//! pyrmute: mutation syntax over persistent data structures.
//!
//! Rewrites a parsed unit so that attribute assignment, item assignment,
//! deletion and mutating method calls evolve persistent values and rebind
//! the result, and so that composite literals build persistent values.

// Engine crates
pub use pyrmute_core;
pub use pyrmute_rewrite;
pub use pyrmute_runtime;

pub use pyrmute_core::{Config, Module};
pub use pyrmute_rewrite::{rewrite_function, rewrite_module, RewriteGuard, RewriteOptions};
pub use pyrmute_runtime::Interpreter;

// Front door
pub mod cli;
pub mod error;
pub mod output;
