//! Compile-only test to verify the public API surface.
//!
//! If this file fails to compile, a public re-export has been removed.

#![allow(unused_imports)]

// ============================================================================
// Tree model
// ============================================================================

use pyrmute::pyrmute_core::render::{expr_source, stmt_source, to_source};
use pyrmute::pyrmute_core::{
    build, walk_module, Config, ConfigError, CoreError, Expr, ExprContext, ExprKind, Location,
    Module, NodeKind, NodeRef, Stmt, StmtKind, SymbolPath, VisitResult, Visitor,
};

// ============================================================================
// Rewrite engine
// ============================================================================

use pyrmute::pyrmute_rewrite::{
    method_call_pattern, normalize, reserve_existing, rewrite, rewrite_function, rewrite_module,
    Captures, GuardScope, LeafValue, Matcher, Names, Pattern, PatternError, RewriteError,
    RewriteGuard, RewriteOptions, RewriteOutput, Rewriter, Rewritten,
};

// ============================================================================
// Runtime
// ============================================================================

use pyrmute::pyrmute_runtime::{
    del_attr_with_fallback, del_subscript_with_fallback, invoke, set_attr_with_fallback,
    set_subscript_with_fallback, Capability, EvolvedMethodTable, Evolver, Interpreter, Key,
    RuntimeError, TypeTag, Value,
};

// ============================================================================
// Front door
// ============================================================================

use pyrmute::cli::{collect_inputs, run_exec, run_render, run_rewrite, OutputFormat};
use pyrmute::error::{OutputErrorCode, PyrmuteError};
use pyrmute::output::{
    emit_response, ContentHash, ErrorInfo, ErrorResponse, ExecResponse, FileResult,
    RewriteResponse, SCHEMA_VERSION,
};

#[test]
fn api_surface_compiles() {
    let _ = std::any::type_name::<Module>();
    let _ = std::any::type_name::<Rewriter<'static>>();
    let _ = std::any::type_name::<Interpreter>();
    let _ = std::any::type_name::<PyrmuteError>();
    let _ = std::any::type_name::<RewriteResponse>();
}

#[test]
fn schema_version_is_stable() {
    assert_eq!(SCHEMA_VERSION, "1");
}
