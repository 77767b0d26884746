// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Core tree model for pyrmute.
//!
//! This crate provides the language-level infrastructure the rewrite engine
//! and the runtime share:
//! - Tree node types with source locations ([`ast`])
//! - Borrowed, field-addressable views over nodes ([`node`])
//! - Read-only traversal ([`visit`])
//! - Node constructors for synthesized code ([`build`])
//! - Source rendering of a tree ([`render`])
//! - Configuration of runtime symbol paths ([`config`])

pub mod ast;
pub mod build;
pub mod config;
pub mod error;
pub mod node;
pub mod render;
pub mod visit;

pub use ast::{
    Alias, BoolOperator, CmpOperator, Comprehension, Constant, DictEntry, ExceptHandler, Expr,
    ExprContext, ExprKind, Keyword, Location, Module, Operator, Param, ParamKind, Stmt, StmtKind,
    UnaryOperator, WithItem,
};
pub use config::{Config, ConfigError, SymbolPath};
pub use error::CoreError;
pub use node::{FieldRef, Leaf, NodeKind, NodeRef, SeqRef};
pub use visit::{walk_module, walk_node, VisitResult, Visitor};
